// Interactive session
//
// - state: AppState and the derived enable/disable rules
// - command: parsing of one input line into a Command
// - controller: applies commands and background events to the state
// - render: plain-text views of the credential screen, editor and summary

pub mod command;
pub mod controller;
pub mod render;
pub mod state;

pub use command::{Command, ParseError, VideoTarget};
pub use controller::{AppController, AppEvent, Flow, Notice};
pub use state::{AppState, GlobalAction, Screen, SessionSettings};
