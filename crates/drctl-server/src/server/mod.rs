//! gRPC server implementations for drctl.

pub mod job_svc;


pub use job_svc::JobServiceImpl;
