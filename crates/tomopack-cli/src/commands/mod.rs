pub mod relax;
