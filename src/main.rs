use color_eyre::Result;
use emupad::controller::{ControlState, InputSource, PollerHandle, PollerSettings};
use emupad::extension::{ClassicController, Extension};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Scripted stand-in for a device backend: expression -> sample.
struct ScriptedPad {
    samples: HashMap<String, ControlState>,
}

impl ScriptedPad {
    fn new() -> Self {
        let mut samples = HashMap::new();
        samples.insert("Buttons/A".to_string(), 1.0);
        samples.insert("D-Pad/Right".to_string(), 1.0);
        samples.insert("Left Stick/Up".to_string(), 0.5);
        samples.insert("Right Stick/Left".to_string(), 1.0);
        samples.insert("Triggers/L-Analog".to_string(), 0.7);
        Self { samples }
    }
}

impl InputSource for ScriptedPad {
    fn sample(&self, expression: &str) -> ControlState {
        self.samples.get(expression).copied().unwrap_or(0.0)
    }

    fn bound_count(&self, expression: &str) -> usize {
        usize::from(self.samples.contains_key(expression))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    info!("Building Classic controller");
    let pad = Arc::new(ClassicController::new());

    // Bind every control to "<group>/<control>" and feed the scripted scene.
    let source = ScriptedPad::new();
    {
        let mut state = pad.controller().state_lock();
        for group in state.groups_mut() {
            let group_name = group.name().to_string();
            for control in group.controls_mut() {
                let expression = format!("{}/{}", group_name, control.name());
                control.reference_mut().set_expression(expression);
            }
        }
        state.update_references(&source);
    }

    info!("Any button pressed: {}", pad.is_button_pressed());

    let poller = PollerHandle::spawn(pad.clone(), Some(PollerSettings { interval_ms: 10 }));
    let mut frames = poller.subscribe();
    for _ in 0..3 {
        frames.changed().await?;
        let frame = frames.borrow().clone();
        info!("Extension frame: {:02X?}", frame.bytes);
    }

    info!(
        "Identifier: {:02X?}, calibration: {:02X?}",
        pad.identifier(),
        pad.calibration()
    );
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
