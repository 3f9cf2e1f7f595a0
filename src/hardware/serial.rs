//! Serial link to the board controller
//!
//! One task owns the port. Inbound lines become coordinator inputs;
//! motion plans received on the actuator channel are written out one
//! command per line. Without a usable port the link runs in simulation
//! mode and plans are discarded.

use crate::game::events::Input;
use crate::hardware::error::{HardwareError, HardwareResult};
use crate::hardware::planner::MotionPlan;
use crate::hardware::protocol::{parse_line, BoardLine};
use shared::protocol::{Link, LinkState};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct SerialLink {
    port: Option<String>,
    baud_rate: u32,
}

impl SerialLink {
    pub fn new(port: Option<String>, baud_rate: u32) -> Self {
        Self { port, baud_rate }
    }

    fn open(&self, port: &str) -> HardwareResult<SerialStream> {
        tokio_serial::new(port, self.baud_rate)
            .open_native_async()
            .map_err(|source| HardwareError::Open {
                port: port.to_string(),
                source,
            })
    }

    /// Drive the link until the coordinator goes away.
    pub async fn run(self, inputs: UnboundedSender<Input>, plans: UnboundedReceiver<MotionPlan>) {
        let Some(port) = self.port.clone() else {
            info!("[ROBOT] No serial port configured, running in simulation mode");
            report(&inputs, LinkState::Sim);
            discard(plans).await;
            return;
        };

        info!("[ROBOT] Opening {} at {} baud", port, self.baud_rate);
        let stream = match self.open(&port) {
            Ok(stream) => stream,
            Err(e) => {
                warn!("[ROBOT] {}. Starting in simulation mode", e);
                report(&inputs, LinkState::Sim);
                discard(plans).await;
                return;
            }
        };

        info!("[ROBOT] Serial link established");
        report(&inputs, LinkState::Online);

        let mut plans = plans;
        match pump(stream, &inputs, &mut plans).await {
            Ok(LinkEnd::CoordinatorGone) => return,
            Ok(LinkEnd::PortClosed) => warn!("[ROBOT] Serial port closed by the controller"),
            Err(e) => error!("[ROBOT] {}", e),
        }
        report(&inputs, LinkState::Offline);
        discard(plans).await;
    }
}

enum LinkEnd {
    PortClosed,
    CoordinatorGone,
}

/// Relay both directions until the port fails or the plan channel closes.
///
/// Bytes that are not valid UTF-8 are replaced, not treated as a port
/// failure.
async fn pump<S>(
    stream: S,
    inputs: &UnboundedSender<Input>,
    plans: &mut UnboundedReceiver<MotionPlan>,
) -> HardwareResult<LinkEnd>
where
    S: AsyncRead + AsyncWrite,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    // Partial reads survive a cancelled `read_until`, so the buffer lives across iterations
    let mut line = Vec::new();

    loop {
        tokio::select! {
            read = reader.read_until(b'\n', &mut line) => {
                if read? == 0 {
                    return Ok(LinkEnd::PortClosed);
                }
                forward(inputs, &String::from_utf8_lossy(&line));
                line.clear();
            }
            plan = plans.recv() => match plan {
                Some(plan) => write_plan(&mut writer, &plan).await?,
                None => return Ok(LinkEnd::CoordinatorGone),
            },
        }
    }
}

fn forward(inputs: &UnboundedSender<Input>, line: &str) {
    let input = match parse_line(line) {
        Some(BoardLine::Sensor(event)) => Input::Sensor(event),
        Some(BoardLine::Text(text)) => Input::BoardLog(text),
        None => {
            debug!("[ROBOT] Dropped line {:?}", line);
            return;
        }
    };
    let _ = inputs.send(input);
}

/// Write every command of `plan`, newline-terminated, in order.
pub async fn write_plan<W>(writer: &mut W, plan: &MotionPlan) -> HardwareResult<()>
where
    W: AsyncWrite + Unpin,
{
    for command in plan.commands() {
        writer.write_all(format!("{command}\n").as_bytes()).await?;
    }
    writer.flush().await?;
    Ok(())
}

fn report(inputs: &UnboundedSender<Input>, state: LinkState) {
    let _ = inputs.send(Input::LinkStatus {
        link: Link::Arduino,
        state,
    });
}

async fn discard(mut plans: UnboundedReceiver<MotionPlan>) {
    while let Some(plan) = plans.recv().await {
        debug!("[ROBOT] No actuator, dropping {} commands", plan.len());
    }
}
