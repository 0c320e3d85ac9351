//! Named LED update operations
//!
//! Thin wrappers computing the logical command and calling the single
//! LED choke-point. Channel indices are zero-based (0-7).

use crate::command::{LedStatus, LogicalCommand};
use crate::error::{BridgeError, Result};

fn channel_command(
    lookup: fn(usize) -> Option<LogicalCommand>,
    prefix: &str,
    channel: usize,
) -> Result<LogicalCommand> {
    lookup(channel)
        .ok_or_else(|| BridgeError::UnknownCommand(format!("{}_channel_{}", prefix, channel + 1)))
}

macro_rules! led_updates {
    ($( $fn_name:ident => $command:ident; )*) => {
        impl super::Interconnector {
            $(
                pub fn $fn_name(&mut self, status: LedStatus) -> Result<()> {
                    self.update_led(LogicalCommand::$command, status)
                }
            )*
        }
    };
}

impl super::Interconnector {
    pub fn update_led_channel_record_ready(&mut self, channel: usize, status: LedStatus) -> Result<()> {
        let command = channel_command(LogicalCommand::record_ready_channel, "record_ready", channel)?;
        self.update_led(command, status)
    }

    pub fn update_led_channel_solo(&mut self, channel: usize, status: LedStatus) -> Result<()> {
        let command = channel_command(LogicalCommand::solo_channel, "solo", channel)?;
        self.update_led(command, status)
    }

    pub fn update_led_channel_mute(&mut self, channel: usize, status: LedStatus) -> Result<()> {
        let command = channel_command(LogicalCommand::mute_channel, "mute", channel)?;
        self.update_led(command, status)
    }

    pub fn update_led_channel_select(&mut self, channel: usize, status: LedStatus) -> Result<()> {
        let command = channel_command(LogicalCommand::select_channel, "select", channel)?;
        self.update_led(command, status)
    }
}

led_updates! {
    update_led_assignment_track => AssignmentTrack;
    update_led_assignment_send => AssignmentSend;
    update_led_assignment_pan_surround => AssignmentPanSurround;
    update_led_assignment_plug_in => AssignmentPlugIn;
    update_led_assignment_eq => AssignmentEq;
    update_led_assignment_instrument => AssignmentInstrument;
    update_led_flip => Flip;
    update_led_global_view => GlobalView;
    update_led_automation_read_off => AutomationReadOff;
    update_led_automation_write => AutomationWrite;
    update_led_automation_trim => AutomationTrim;
    update_led_automation_touch => AutomationTouch;
    update_led_automation_latch => AutomationLatch;
    update_led_group => Group;
    update_led_utilities_save => UtilitiesSave;
    update_led_utilities_undo => UtilitiesUndo;
    update_led_marker => Marker;
    update_led_nudge => Nudge;
    update_led_cycle => Cycle;
    update_led_drop => Drop;
    update_led_replace => Replace;
    update_led_click => Click;
    update_led_solo => Solo;
    update_led_rewind => Rewind;
    update_led_fast_forward => FastForward;
    update_led_stop => Stop;
    update_led_play => Play;
    update_led_record => Record;
    update_led_zoom => Zoom;
    update_led_scrub => Scrub;
    update_led_smpte => Smpte;
    update_led_beats => Beats;
    update_led_rude_solo => RudeSolo;
    update_led_relay_click => RelayClick;
}
