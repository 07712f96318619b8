//! Fixed-width row formatting for the character display.
//!
//! The display driver is a collaborator behind [`TextDisplay`]; this module
//! turns controller state into padded 20-column rows so stale characters
//! never survive a rewrite. Layout: rows 0–1 are the clock header, rows 2–3
//! the menu window (or, on the alarm screen, status and control rows).

use core::fmt::Write as _;

use crate::clock::Timestamp;
use crate::menu::{Navigator, Screen};

/// Display geometry of the 20x4 character module.
pub const DISPLAY_COLS: usize = 20;
pub const DISPLAY_ROWS: u8 = 4;

/// Rows reserved for the time/date header; menus render below.
pub const HEADER_ROWS: u8 = 2;

/// One full display row.
pub type Row = heapless::String<DISPLAY_COLS>;

/// Trait for abstracting the character display driver.
///
/// `write_at` positions the cursor and writes fixed-width ASCII. Handle
/// hardware errors internally — rendering cannot fail; a glitched frame is
/// repaired by the next redraw.
pub trait TextDisplay {
    fn clear(&mut self);
    fn write_at(&mut self, col: u8, row: u8, text: &str);
}

/// Pads (or truncates) to the full display width.
fn padded(text: &str) -> Row {
    let mut row = Row::new();
    for c in text.chars().take(DISPLAY_COLS) {
        let _ = row.push(c);
    }
    while row.push(' ').is_ok() {}
    row
}

/// Header row 0: `Time: HH:MM:SS`, right-aligned like the original layout.
pub fn time_row<D: TextDisplay>(display: &mut D, time: &str) {
    let mut row = Row::new();
    let _ = write!(row, "Time: {:>13}", time);
    display.write_at(0, 0, &padded(&row));
}

/// Header row 1: `Date: DD.MM.YYYY`.
pub fn date_row<D: TextDisplay>(display: &mut D, date: &str) {
    let mut row = Row::new();
    let _ = write!(row, "Date: {:>13}", date);
    display.write_at(0, 1, &padded(&row));
}

/// Blanks the menu rows below the header.
pub fn clear_menu_rows<D: TextDisplay>(display: &mut D) {
    for row in HEADER_ROWS..DISPLAY_ROWS {
        display.write_at(0, row, &padded(""));
    }
}

/// Draws the visible menu window with a `>` cursor on the selection.
///
/// On the main screen an armed alarm is flagged with an `AL` tag at the end
/// of the first row.
pub fn menu<D: TextDisplay>(display: &mut D, nav: &Navigator, alarm_armed: bool) {
    clear_menu_rows(display);
    let items = nav.screen().items();
    for (line, index) in (nav.scroll()..items.len())
        .take(nav.screen().visible_rows())
        .enumerate()
    {
        let prefix = if index == nav.selected() { '>' } else { ' ' };
        let mut row = Row::new();
        if nav.screen() == Screen::Main && index == 0 && alarm_armed {
            let _ = write!(row, "{}{:<17}AL", prefix, items[index]);
        } else {
            let _ = write!(row, "{}{:<19}", prefix, items[index]);
        }
        display.write_at(0, HEADER_ROWS + line as u8, &padded(&row));
    }
}

/// Full-screen alarm banner with the ringing status and the selected
/// control. Always drawn from a cleared display; the banner owns all rows.
pub fn alarm_screen<D: TextDisplay>(display: &mut D, paused: bool, nav: &Navigator) {
    display.clear();
    display.write_at(0, 0, &padded("!!! ALARM !!!"));

    let mut status = Row::new();
    let _ = write!(
        status,
        "Status: {:<12}",
        if paused { "PAUSED" } else { "PLAYING" }
    );
    display.write_at(0, 2, &padded(&status));

    let mut control = Row::new();
    let _ = write!(control, ">{:<19}", nav.screen().items()[nav.selected()]);
    display.write_at(0, 3, &padded(&control));
}

/// Result line of a menu action (`NTP Sync OK`, `Saved to RTC`, ...),
/// shown on the first menu row.
pub fn action_result<D: TextDisplay>(display: &mut D, text: &str) {
    display.write_at(0, HEADER_ROWS, &padded(text));
}

/// Transient notification on the bottom row (`Alarm set: 07:30`,
/// `Snoozed to 07:05`, error lines).
pub fn notice<D: TextDisplay>(display: &mut D, text: &str) {
    display.write_at(0, DISPLAY_ROWS - 1, &padded(text));
}

/// The RTC inspection view: time and date on the menu rows.
pub fn rtc_view<D: TextDisplay>(display: &mut D, timestamp: &Timestamp) {
    display.write_at(0, 2, &padded(&timestamp.format_time()));
    display.write_at(0, 3, &padded(&timestamp.format_date()));
}

#[cfg(test)]
mod tests {
    use super::*;
    extern crate std;
    use std::string::String;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingDisplay {
        writes: Vec<(u8, u8, String)>,
        cleared: usize,
    }

    impl TextDisplay for RecordingDisplay {
        fn clear(&mut self) {
            self.cleared += 1;
        }

        fn write_at(&mut self, col: u8, row: u8, text: &str) {
            self.writes.push((col, row, String::from(text)));
        }
    }

    #[test]
    fn rows_are_always_full_width() {
        let mut d = RecordingDisplay::default();
        time_row(&mut d, "07:03:09");
        notice(&mut d, "Alarm set: 07:30");

        for (_, _, text) in &d.writes {
            assert_eq!(text.len(), DISPLAY_COLS);
        }
        assert_eq!(d.writes[0].2, "Time:      07:03:09 ");
        assert_eq!(d.writes[1].1, DISPLAY_ROWS - 1);
    }

    #[test]
    fn main_menu_marks_selection_and_armed_alarm() {
        let mut d = RecordingDisplay::default();
        let nav = Navigator::new();
        menu(&mut d, &nav, true);

        // two blanked rows, then the two items
        assert_eq!(d.writes.len(), 4);
        assert_eq!(d.writes[2].2, ">Get NTP Time     AL");
        assert_eq!(d.writes[3].2, " Get RTC Time       ");
    }

    #[test]
    fn scrolled_submenu_shows_the_window() {
        let mut d = RecordingDisplay::default();
        let mut nav = Navigator::new();
        nav.press(); // NtpMenu
        nav.select(2); // scrolls to the last two items

        menu(&mut d, &nav, false);
        assert_eq!(d.writes[2].2, " Save to RTC        ");
        assert_eq!(d.writes[3].2, ">Back               ");
    }

    #[test]
    fn alarm_banner_owns_the_whole_display() {
        let mut d = RecordingDisplay::default();
        let mut nav = Navigator::new();
        nav.enter_alarm_control();

        alarm_screen(&mut d, false, &nav);
        assert_eq!(d.cleared, 1);
        assert_eq!(d.writes[0].2, "!!! ALARM !!!       ");
        assert_eq!(d.writes[1].2, "Status: PLAYING     ");
        assert_eq!(d.writes[2].2, ">Pause/Resume       ");

        alarm_screen(&mut d, true, &nav);
        assert_eq!(d.writes[4].2, "Status: PAUSED      ");
    }
}
