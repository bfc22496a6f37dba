//! The test inventory: folders, files, suites and functions.
//!
//! The forest is stored in arenas owned by [`Tests`]. Parents hold child
//! indices and children hold a back-index to their parent, so "upstream"
//! rollups are plain post-order traversals.

mod selection;
mod status;
mod tree;

pub use selection::{RunTarget, TestsToRun};
pub use status::TestStatus;
pub use tree::{
    FileId, FlattenedTestFunction, FlattenedTestSuite, FolderId, FunctionId, Outcome, ParentRef,
    Summary, SuiteId, TestFile, TestFolder, TestFunction, TestSuite, Tests,
};
