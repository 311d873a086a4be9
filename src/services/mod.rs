// Business logic services

pub mod calendar_service;
pub mod class_service;
pub mod exercise_service;
pub mod reservation_service;
pub mod routine_service;
pub mod user_service;

pub use calendar_service::CalendarService;
pub use class_service::ClassService;
pub use exercise_service::ExerciseService;
pub use reservation_service::{Booking, ReservationService};
pub use routine_service::{RoutineService, Viewer};
pub use user_service::UserService;
