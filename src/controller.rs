//! The cooperative scheduler-loop body.
//!
//! [`Controller`] owns every component and all hardware handles; the
//! embedding binary runs `loop { let idle = controller.service(); sleep(idle) }`
//! and implements the hardware traits. One `service` call performs, in
//! order: opportunistic clock-header refresh, one serial command, the
//! once-per-second alarm check, the melody tick, then the debounced encoder
//! and button polls. Everything is non-blocking except the short, bounded
//! holds after user-visible actions (sync results, confirmations, the RTC
//! view), during which the interrupt-fed edge cell keeps capturing button
//! presses.

use core::fmt::Write as _;

use crate::alarm::{Alarm, AlarmEvent, SettingsStore};
use crate::clock::{Rtc, Timestamp};
use crate::command::{self, CommandError, RemoteCommand, SerialPort};
use crate::input::{ButtonDebouncer, EdgeCell, EncoderDebouncer, InputEvent, RotaryEncoder};
use crate::melody::{Buzzer, MelodyPlayer};
use crate::menu::{MenuAction, Navigator, Screen};
use crate::render::{self, TextDisplay};
use crate::time::TickSource;

/// Errors from the network time collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetTimeError {
    /// The network link could not be brought up.
    NoNetwork,

    /// Connected, but the time sync itself failed.
    SyncFailed,
}

impl core::fmt::Display for NetTimeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NetTimeError::NoNetwork => write!(f, "network unavailable"),
            NetTimeError::SyncFailed => write!(f, "time sync failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NetTimeError {}

/// Trait for abstracting the network time source (Wi-Fi + NTP or similar).
///
/// `fetch` may block for a few seconds while connecting; the scheduler
/// accepts that for this user-initiated action. The returned timestamp is
/// already in local time.
pub trait NetTime {
    fn fetch(&mut self) -> Result<Timestamp, NetTimeError>;
}

/// Tuning values for the control loop, with the shipped device's defaults.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Button debounce window.
    pub button_debounce_ms: u32,

    /// Encoder settle window.
    pub encoder_settle_ms: u32,

    /// Snooze delay added to the current time.
    pub snooze_minutes: u32,

    /// Maximum continuous ring time before the alarm stops itself.
    pub max_ring_ms: u32,

    /// Melody note interval.
    pub melody_tick_ms: u32,

    /// Recommended sleep at the tail of each loop iteration.
    pub idle_tick_ms: u32,

    /// Hold time for one-line confirmations and results.
    pub message_hold_ms: u32,

    /// Hold time for the RTC inspection view.
    pub view_hold_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            button_debounce_ms: 300,
            encoder_settle_ms: 50,
            snooze_minutes: 5,
            max_ring_ms: 300_000,
            melody_tick_ms: crate::melody::DEFAULT_TICK_MS,
            idle_tick_ms: 50,
            message_hold_ms: 1000,
            view_hold_ms: 2000,
        }
    }
}

/// The hardware handles the controller takes ownership of.
///
/// Each field is a trait implementation over the platform's driver; see the
/// trait docs for the contracts.
pub struct Hardware<R, D, B, E, S, P, N> {
    pub rtc: R,
    pub display: D,
    pub buzzer: B,
    pub encoder: E,
    pub store: S,
    pub serial: P,
    pub net_time: N,
}

/// Owns all state and drives one scheduler iteration per [`service`] call.
///
/// # Type parameters
/// * `'a` - lifetime of the tick source, edge cell and melody table
/// * `T` - monotonic tick source
/// * `R`/`D`/`B`/`E`/`S`/`P`/`N` - hardware trait implementations
///
/// [`service`]: Controller::service
pub struct Controller<'a, T, R, D, B, E, S, P, N>
where
    T: TickSource,
    R: Rtc,
    D: TextDisplay,
    B: Buzzer,
    E: RotaryEncoder,
    S: SettingsStore,
    P: SerialPort,
    N: NetTime,
{
    tick: &'a T,
    edges: &'a EdgeCell,
    rtc: R,
    display: D,
    buzzer: B,
    encoder: E,
    serial: P,
    net_time: N,
    alarm: Alarm<S>,
    nav: Navigator,
    melody: MelodyPlayer<'a>,
    button: ButtonDebouncer,
    encoder_events: EncoderDebouncer,
    shown_time: heapless::String<8>,
    shown_date: heapless::String<10>,
    last_sync: Option<Timestamp>,
    config: Config,
}

impl<'a, T, R, D, B, E, S, P, N> Controller<'a, T, R, D, B, E, S, P, N>
where
    T: TickSource,
    R: Rtc,
    D: TextDisplay,
    B: Buzzer,
    E: RotaryEncoder,
    S: SettingsStore,
    P: SerialPort,
    N: NetTime,
{
    /// Loads the persisted alarm, silences the buzzer and draws the initial
    /// screen. The edge cell is the one shared with the button interrupt
    /// handler.
    pub fn new(
        hardware: Hardware<R, D, B, E, S, P, N>,
        edges: &'a EdgeCell,
        tick: &'a T,
        melody: &'a [u16],
        config: Config,
    ) -> Self {
        let Hardware {
            rtc,
            mut display,
            mut buzzer,
            mut encoder,
            store,
            serial,
            net_time,
        } = hardware;

        let alarm = Alarm::new(store, config.snooze_minutes, config.max_ring_ms);
        buzzer.silence();
        display.clear();
        encoder.set_bound(Screen::Main.encoder_bound());
        let initial_position = encoder.value();

        let mut controller = Self {
            tick,
            edges,
            rtc,
            display,
            buzzer,
            encoder,
            serial,
            net_time,
            alarm,
            nav: Navigator::new(),
            melody: MelodyPlayer::new(melody, config.melody_tick_ms),
            button: ButtonDebouncer::new(config.button_debounce_ms),
            encoder_events: EncoderDebouncer::new(config.encoder_settle_ms, initial_position),
            shown_time: heapless::String::new(),
            shown_date: heapless::String::new(),
            last_sync: None,
            config,
        };
        controller.refresh_clock();
        controller.redraw_menu();
        controller
    }

    /// Runs one scheduler iteration and returns the recommended idle sleep
    /// in milliseconds.
    pub fn service(&mut self) -> u32 {
        let now_ms = self.tick.ticks_ms();

        if self.nav.screen() != Screen::AlarmControl {
            self.refresh_clock();
        }

        self.drain_command();

        match self.alarm.check(&mut self.rtc, now_ms) {
            Some(AlarmEvent::Triggered) => self.on_triggered(now_ms),
            Some(AlarmEvent::Expired) => {
                self.buzzer.silence();
                self.close_alarm_screen();
            }
            None => {}
        }

        self.melody
            .tick(self.alarm.is_playing(), now_ms, &mut self.buzzer);

        let raw_position = self.encoder.value();
        if let Some(position) = self.encoder_events.poll(raw_position, now_ms) {
            self.on_event(InputEvent::PositionChanged(position));
        }
        if self.button.poll(self.edges) {
            self.on_event(InputEvent::ButtonPressed);
        }

        self.config.idle_tick_ms
    }

    /// Current runtime alarm state, for embeddings that mirror it elsewhere.
    pub fn alarm(&self) -> &Alarm<S> {
        &self.alarm
    }

    /// Current navigation state.
    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    fn on_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PositionChanged(position) => {
                self.nav.select(position);
                self.redraw_active();
            }
            InputEvent::ButtonPressed => self.on_press(),
        }
    }

    fn on_press(&mut self) {
        let before = self.nav.screen();
        match self.nav.press() {
            Some(action) => self.run_action(action),
            None => {
                // pure navigation: enter submenu or back to main
                if self.nav.screen() != before {
                    self.encoder.set_bound(self.nav.screen().encoder_bound());
                }
                self.redraw_menu();
            }
        }
    }

    fn run_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::SyncNtp => {
                match self.net_time.fetch() {
                    Ok(timestamp) => {
                        self.last_sync = Some(timestamp);
                        render::action_result(&mut self.display, "NTP Sync OK");
                    }
                    Err(NetTimeError::NoNetwork) => {
                        render::action_result(&mut self.display, "WiFi Failed");
                    }
                    Err(NetTimeError::SyncFailed) => {
                        render::action_result(&mut self.display, "NTP Error");
                    }
                }
                self.tick.wait_ms(self.config.message_hold_ms);
                self.redraw_menu();
            }
            MenuAction::SaveToRtc => {
                // nothing to save before the first successful sync
                let Some(timestamp) = self.last_sync else {
                    return;
                };
                match self.rtc.write(&timestamp) {
                    Ok(()) => render::action_result(&mut self.display, "Saved to RTC"),
                    Err(_) => {
                        warn_log!("RTC write of sync result failed");
                        render::action_result(&mut self.display, "RTC Set Error");
                    }
                }
                self.tick.wait_ms(self.config.message_hold_ms);
                self.redraw_menu();
            }
            MenuAction::ViewRtcTime => {
                match self.rtc.read() {
                    Ok(timestamp) => render::rtc_view(&mut self.display, &timestamp),
                    Err(_) => {
                        warn_log!("RTC read for view failed");
                        render::action_result(&mut self.display, "RTC Read Error");
                    }
                }
                self.tick.wait_ms(self.config.view_hold_ms);
                self.redraw_menu();
            }
            MenuAction::PauseResume => {
                if self.alarm.pause() {
                    self.buzzer.silence();
                } else {
                    self.alarm.resume();
                }
                self.redraw_alarm_banner();
            }
            MenuAction::StopAlarm => {
                if self.alarm.stop() {
                    self.buzzer.silence();
                    self.close_alarm_screen();
                }
            }
            MenuAction::SnoozeAlarm => self.do_snooze(),
        }
    }

    fn drain_command(&mut self) {
        let Some(line) = self.serial.poll_line() else {
            return;
        };
        match command::parse_line(&line) {
            Ok(cmd) => self.run_command(cmd),
            Err(CommandError::UnknownCommand) => {
                warn_log!("unknown serial command");
            }
            Err(error) => {
                warn_log!("rejected serial command: {}", error);
                self.serial.write_line(&command::error_line(error));
                if error == CommandError::InvalidTime {
                    render::notice(&mut self.display, "Invalid Time");
                    self.tick.wait_ms(self.config.message_hold_ms);
                }
            }
        }
    }

    fn run_command(&mut self, cmd: RemoteCommand) {
        match cmd {
            RemoteCommand::SetAlarm(time) => {
                if self.alarm.set(time.hour, time.minute).is_ok() {
                    let mut msg: heapless::String<20> = heapless::String::new();
                    let _ = write!(msg, "Alarm set: {}", time.format());
                    render::notice(&mut self.display, &msg);
                    self.tick.wait_ms(self.config.message_hold_ms);
                    if self.nav.screen() != Screen::AlarmControl {
                        self.redraw_menu();
                    }
                }
            }
            RemoteCommand::ClearAlarm => {
                let was_ringing = self.alarm.clear();
                self.buzzer.silence();
                if was_ringing {
                    self.close_alarm_screen();
                }
                render::notice(&mut self.display, "Alarm cleared");
                self.tick.wait_ms(self.config.message_hold_ms);
                if self.nav.screen() != Screen::AlarmControl {
                    self.redraw_menu();
                }
            }
            RemoteCommand::Pause => {
                if self.alarm.pause() {
                    self.buzzer.silence();
                    self.redraw_alarm_banner();
                }
            }
            RemoteCommand::Resume => {
                if self.alarm.resume() {
                    self.redraw_alarm_banner();
                }
            }
            RemoteCommand::Snooze => self.do_snooze(),
            RemoteCommand::QueryStatus => {
                let line = command::status_line(self.alarm.config(), self.alarm.status());
                self.serial.write_line(&line);
            }
            RemoteCommand::SetClock(timestamp) => match self.rtc.write(&timestamp) {
                Ok(()) => {
                    let mut msg: heapless::String<20> = heapless::String::new();
                    let _ = write!(msg, "RTC Set: {}", timestamp.format_time());
                    render::notice(&mut self.display, &msg);
                    self.tick.wait_ms(self.config.message_hold_ms);
                }
                Err(_) => {
                    warn_log!("remote RTC write failed");
                    render::notice(&mut self.display, "RTC Set Error");
                    self.tick.wait_ms(self.config.message_hold_ms);
                }
            },
        }
    }

    fn do_snooze(&mut self) {
        match self.rtc.read() {
            Ok(timestamp) => {
                let Some(target) = self.alarm.snooze(timestamp.time_of_day()) else {
                    return;
                };
                self.buzzer.silence();
                let mut msg: heapless::String<20> = heapless::String::new();
                let _ = write!(msg, "Snoozed to {}", target.format());
                render::notice(&mut self.display, &msg);
                self.tick.wait_ms(self.config.message_hold_ms);
                self.close_alarm_screen();
            }
            Err(_) => {
                // keep ringing rather than snooze to an unknown target
                warn_log!("RTC read for snooze failed");
                render::notice(&mut self.display, "Snooze Error");
            }
        }
    }

    fn on_triggered(&mut self, now_ms: u32) {
        self.buzzer.silence();
        self.melody.reset(now_ms);
        self.nav.enter_alarm_control();
        self.encoder.set_bound(Screen::AlarmControl.encoder_bound());
        render::alarm_screen(&mut self.display, false, &self.nav);
    }

    /// Leaves the alarm screen after stop/snooze/expiry: back to Main with
    /// a full redraw, because the banner overwrote the whole display.
    fn close_alarm_screen(&mut self) {
        if self.nav.screen() != Screen::AlarmControl {
            return;
        }
        self.nav.exit_alarm_control();
        self.encoder.set_bound(Screen::Main.encoder_bound());
        self.display.clear();
        self.shown_time.clear();
        self.shown_date.clear();
        self.refresh_clock();
        self.redraw_menu();
    }

    /// Rewrites the header rows only when the formatted text changed, to
    /// keep per-iteration display I/O near zero.
    fn refresh_clock(&mut self) {
        match self.rtc.read() {
            Ok(timestamp) => {
                let time = timestamp.format_time();
                if time != self.shown_time {
                    render::time_row(&mut self.display, &time);
                    self.shown_time = time;
                }
                let date = timestamp.format_date();
                if date != self.shown_date {
                    render::date_row(&mut self.display, &date);
                    self.shown_date = date;
                }
            }
            Err(_) => warn_log!("RTC read for clock refresh failed"),
        }
    }

    fn redraw_menu(&mut self) {
        let armed = self.alarm.config().armed();
        render::menu(&mut self.display, &self.nav, armed);
    }

    fn redraw_active(&mut self) {
        if self.nav.screen() == Screen::AlarmControl {
            self.redraw_alarm_banner();
        } else {
            self.redraw_menu();
        }
    }

    fn redraw_alarm_banner(&mut self) {
        if self.nav.screen() == Screen::AlarmControl {
            let paused = !self.alarm.is_playing();
            render::alarm_screen(&mut self.display, paused, &self.nav);
        }
    }
}
