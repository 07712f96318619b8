//! Menu navigation: screens, selection and the scroll window.
//!
//! Screens are data — an item list and a visible-window size — so adding a
//! menu entry is a table edit, not new control flow. [`Navigator`] owns the
//! UI state and maps debounced input events to screen transitions and
//! [`MenuAction`]s for the controller to execute.

/// The four screens of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Clock header plus the two top-level menu entries.
    Main,

    /// Network time actions.
    NtpMenu,

    /// RTC inspection actions.
    RtcMenu,

    /// Ringing-alarm controls; entered only by the alarm triggering.
    AlarmControl,
}

impl Screen {
    /// The fixed item list of this screen.
    pub fn items(&self) -> &'static [&'static str] {
        match self {
            Screen::Main => &["Get NTP Time", "Get RTC Time"],
            Screen::NtpMenu => &["Sync with NTP", "Save to RTC", "Back"],
            Screen::RtcMenu => &["View RTC Time", "Back"],
            Screen::AlarmControl => &["Pause/Resume", "Stop", "Snooze"],
        }
    }

    /// Rows available for items (display rows minus reserved header rows;
    /// the alarm screen spends an extra row on its status line).
    pub fn visible_rows(&self) -> usize {
        match self {
            Screen::AlarmControl => 1,
            _ => 2,
        }
    }

    /// Upper clamp for the rotary encoder on this screen.
    pub fn encoder_bound(&self) -> i32 {
        self.items().len() as i32 - 1
    }
}

/// A menu entry the user activated; executed by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuAction {
    SyncNtp,
    SaveToRtc,
    ViewRtcTime,
    PauseResume,
    StopAlarm,
    SnoozeAlarm,
}

/// The menu/navigation state machine.
pub struct Navigator {
    screen: Screen,
    selected: usize,
    scroll: usize,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            screen: Screen::Main,
            selected: 0,
            scroll: 0,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    /// Index of the highlighted item.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// First visible item index.
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Applies a debounced encoder position: clamps it to the item range
    /// and shifts the scroll window by the minimum amount that keeps the
    /// selection visible.
    pub fn select(&mut self, position: i32) {
        let count = self.screen.items().len();
        self.selected = position.clamp(0, count as i32 - 1) as usize;

        let visible = self.screen.visible_rows();
        if self.selected >= self.scroll + visible {
            self.scroll = self.selected - visible + 1;
        } else if self.selected < self.scroll {
            self.scroll = self.selected;
        }
        self.scroll = self.scroll.min(count.saturating_sub(visible));
    }

    /// Applies a button press on the current screen.
    ///
    /// Screen entry/exit is handled internally; entries that trigger work
    /// are returned as a [`MenuAction`]. The caller should re-clamp the
    /// encoder whenever the screen changed.
    pub fn press(&mut self) -> Option<MenuAction> {
        match (self.screen, self.selected) {
            (Screen::Main, 0) => {
                self.go_to(Screen::NtpMenu);
                None
            }
            (Screen::Main, _) => {
                self.go_to(Screen::RtcMenu);
                None
            }
            (Screen::NtpMenu, 0) => Some(MenuAction::SyncNtp),
            (Screen::NtpMenu, 1) => Some(MenuAction::SaveToRtc),
            (Screen::NtpMenu, _) => {
                self.go_to(Screen::Main);
                None
            }
            (Screen::RtcMenu, 0) => Some(MenuAction::ViewRtcTime),
            (Screen::RtcMenu, _) => {
                self.go_to(Screen::Main);
                None
            }
            (Screen::AlarmControl, 0) => Some(MenuAction::PauseResume),
            (Screen::AlarmControl, 1) => Some(MenuAction::StopAlarm),
            (Screen::AlarmControl, _) => Some(MenuAction::SnoozeAlarm),
        }
    }

    /// Forced entry into the alarm screen; the only transition that happens
    /// without a button press.
    pub fn enter_alarm_control(&mut self) {
        self.go_to(Screen::AlarmControl);
    }

    /// Unconditional return to the main screen after the alarm closes.
    pub fn exit_alarm_control(&mut self) {
        self.go_to(Screen::Main);
    }

    fn go_to(&mut self, screen: Screen) {
        self.screen = screen;
        self.selected = 0;
        self.scroll = 0;
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
