use super::state::SessionStatus;

/// Screens the surface can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Config,
    Session,
}

/// Maps lifecycle state to the screen to render.
///
/// Configuration is a view concern, not a lifecycle state: the configuring
/// flag only matters while the session is idle.
#[derive(Debug, Default)]
pub struct ViewRouter {
    configuring: bool,
}

impl ViewRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_config(&mut self) {
        self.configuring = true;
    }

    pub fn close_config(&mut self) {
        self.configuring = false;
    }

    pub fn screen(&self, status: SessionStatus) -> Screen {
        match status {
            SessionStatus::Idle => {
                if self.configuring {
                    Screen::Config
                } else {
                    Screen::Menu
                }
            }
            SessionStatus::Connecting | SessionStatus::Active | SessionStatus::Terminating => {
                Screen::Session
            }
        }
    }
}
