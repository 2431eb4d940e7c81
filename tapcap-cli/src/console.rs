//! Console progress output driven from session notifications.

use tapcap_core::{CaptureDiagnostics, DeviceInfo, SessionObserver, SessionPhase};

pub struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn phase_changed(&self, phase: &SessionPhase) {
        match phase {
            SessionPhase::WaitingForStop => println!("Please <STOP> the tape."),
            SessionPhase::WaitingForPlay => println!("Press <PLAY> on tape."),
            SessionPhase::Capturing => println!("Reading tape..."),
            _ => {}
        }
    }

    fn device_info(&self, info: &DeviceInfo) {
        println!("* Board: {}", info.board_name);
        println!("* MCU: {} @ {}", info.mcu_name, info.mcu_clock);
        println!("* Firmware: {}", info.firmware_version);
        println!("* Device buffer: {}", info.buffer_size);
        println!("* Timer speed: {} MHz", info.precision_mhz);
        println!("* Sampling rate: {}", info.sampling_rate);
    }

    fn diagnostics(&self, diagnostics: &CaptureDiagnostics) {
        println!(
            "[Lost signals: {}] [Discarded signals: {}] [Overcapture: {}]",
            diagnostics.lost, diagnostics.discarded, diagnostics.overcapture
        );
    }
}
