//! Storage module for the deployment descriptor

pub mod descriptor;

pub use descriptor::{
    parse_descriptor, DeploymentDescriptor, DescriptorError, DescriptorStore,
    DEFAULT_DESCRIPTOR_PATH,
};
