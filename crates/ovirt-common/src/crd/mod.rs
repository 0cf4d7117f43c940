//! Resource records managed by the oVirt machine controller

mod machine;

pub use machine::{
    Machine, MachineAddress, MachineSpec, MachineStatus, MachineTaint, NodeMetadata,
    NodeReference, ProviderSpec, MACHINE_GROUP, MACHINE_KIND, MACHINE_VERSION,
};
