//! System command handlers.

use panos_core::{DeviceSession, JobInfo, SystemInfo};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, SystemArgs, SystemCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Type")]
    job_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Progress")]
    progress: String,
    #[tabled(rename = "Finished")]
    finished: String,
}

fn job_row(job: &JobInfo) -> JobRow {
    JobRow {
        id: job.id.clone(),
        job_type: job.job_type.clone(),
        status: job.status.clone(),
        result: job.result.clone(),
        progress: job.progress.clone(),
        finished: job.finished.clone(),
    }
}

#[derive(Serialize)]
struct HaView {
    device: String,
    serial: String,
    ha_state: panos_core::HaPeerState,
}

fn info_detail(info: &SystemInfo) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    output::detail_lines(&[
        ("Hostname", info.hostname.clone()),
        ("Device name", opt(&info.devicename)),
        ("Serial", info.serial.clone()),
        ("Model", opt(&info.model)),
        ("Version", opt(&info.sw_version)),
        ("Address", opt(&info.ip_address)),
        ("Uptime", opt(&info.uptime)),
        ("Multi-vsys", info.multi_vsys.to_string()),
    ])
}

pub async fn handle<S: DeviceSession>(
    session: &S,
    args: SystemArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rendered = match args.command {
        SystemCommand::Info => {
            let info = session.system_info().await?;
            output::render_single(global.output, &info, info_detail, |i| i.serial.clone())?
        }

        SystemCommand::Ha => {
            let identity = session.identity();
            let view = HaView {
                device: identity.device_name,
                serial: identity.serial,
                ha_state: session.ha_peer_state(),
            };
            let color = output::should_color();
            output::render_single(
                global.output,
                &view,
                |v| {
                    output::detail_lines(&[
                        ("Device", v.device.clone()),
                        ("Serial", v.serial.clone()),
                        ("HA state", output::ha_state(v.ha_state, color)),
                    ])
                },
                |v| v.ha_state.to_string(),
            )?
        }

        SystemCommand::Jobs { id } => {
            let jobs = session.jobs(id).await?;
            output::render_list(global.output, &jobs, job_row, |j| j.id.clone())?
        }
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}
