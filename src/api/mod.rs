// API routes and handlers

pub mod auth;
pub mod calendar;
pub mod classes;
pub mod exercises;
pub mod health;
pub mod reservations;
pub mod routes;
pub mod routines;
pub mod users;
