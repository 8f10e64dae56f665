pub mod boundary_audit;
