pub mod policy;
pub mod resolver;

pub use policy::ReturnToCreatorPolicy;
pub use resolver::AssigneeResolver;
