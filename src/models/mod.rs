pub mod attendance;
pub mod student;
pub mod user;

pub use attendance::{AttendanceRecord, AttendanceStatus, DayStatus, MarkAttendanceRequest};
pub use student::{NewStudent, Student, StudentForm};
pub use user::{Flash, FlashKind, Session, User};
