//! The two puzzle instances.
pub mod city_car;
pub mod tetris;
