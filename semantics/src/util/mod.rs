pub mod named;
