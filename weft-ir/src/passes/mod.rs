pub mod barrier_elim;
