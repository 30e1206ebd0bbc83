//! quizmark-report: renders saved score reports for people.

pub mod html;

pub use html::{generate_html, write_html_report};
