/// An owned dynamically typed [`Future`] used at collaborator boundaries, where trait methods
/// cannot be `async`.
pub type BoxFuture<'a, T> = futures::future::BoxFuture<'a, T>;
