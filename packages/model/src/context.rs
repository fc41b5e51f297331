use crate::ids::PatternId;
use crate::pattern::Pattern;

/// Read-only view used to resolve references while materializing snapshots
///
/// Implemented by the live [`Project`](crate::Project) and by an inert
/// [`ProjectSnapshot`](crate::ProjectSnapshot), so clipboard content copied
/// from another project resolves against the project it came from.
pub trait ProjectContext {
    fn pattern(&self, id: &PatternId) -> Option<&Pattern>;
}
