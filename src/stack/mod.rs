//! Closed identifier types
//!
//! The original design keyed every table by free-form strings; here the
//! manager, runtime tool, and OS identifiers are closed enums so an unknown
//! key cannot appear at runtime.

pub mod id_enum_macro;
pub mod manager_id;
pub mod os;

pub use manager_id::ManagerId;
pub use os::HostOs;

crate::define_id_enum! {
    /// Identifier for anything a version constraint can target: the primary
    /// runtime or one of its package managers.
    ToolId {
        Node => "node" : "Node.js" | "nodejs",
        Npm => "npm" : "npm",
        Yarn => "yarn" : "Yarn",
    }
}
