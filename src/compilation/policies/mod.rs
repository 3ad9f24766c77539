mod reuse_policy;

pub use reuse_policy::ReusePolicy;
