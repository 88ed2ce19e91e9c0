//! Panorama command handlers.

use panos_core::{
    DeviceGroup, DeviceGroupNode, DeviceSession, GatewaySession, HaPeerState, PanoramaSession,
    VsysInfo,
};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat, PanoramaArgs, PanoramaCommand};
use crate::error::CliError;
use crate::output;

/// Only fleet and device-group listings need the managed devices.
pub fn needs_managed_devices(args: &PanoramaArgs) -> bool {
    matches!(
        args.command,
        PanoramaCommand::DeviceGroups | PanoramaCommand::Devices
    )
}

// ── Views ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct DeviceView {
    serial: String,
    hostname: String,
    address: String,
    ha_state: HaPeerState,
    multi_vsys: bool,
    vsys: Vec<VsysInfo>,
}

impl From<GatewaySession> for DeviceView {
    fn from(device: GatewaySession) -> Self {
        Self {
            serial: device.serial().to_owned(),
            hostname: device.hostname().to_owned(),
            address: device.address().to_owned(),
            ha_state: device.ha_peer_state(),
            multi_vsys: device.is_multi_vsys(),
            vsys: device.vsys_info(),
        }
    }
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "HA")]
    ha: String,
    #[tabled(rename = "Vsys")]
    vsys: String,
}

#[derive(Serialize)]
struct TargetView {
    device: String,
    serial: String,
    vsys: Option<String>,
}

#[derive(Serialize)]
struct DeviceGroupView {
    name: String,
    targets: Vec<TargetView>,
}

impl From<DeviceGroup> for DeviceGroupView {
    fn from(group: DeviceGroup) -> Self {
        let targets = group
            .targets()
            .into_iter()
            .map(|t| TargetView {
                serial: t.gateway.serial().to_owned(),
                device: t.device_name,
                vsys: t.vsys,
            })
            .collect();
        Self {
            name: group.name().to_owned(),
            targets,
        }
    }
}

#[derive(Tabled)]
struct DeviceGroupRow {
    #[tabled(rename = "Device group")]
    name: String,
    #[tabled(rename = "Targets")]
    targets: String,
}

#[derive(Serialize)]
struct TagView {
    device: String,
    tags: Vec<String>,
}

#[derive(Tabled)]
struct TagRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn handle(
    panorama: &PanoramaSession,
    args: PanoramaArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let format = global.output;
    let rendered = match args.command {
        PanoramaCommand::Devices => devices(panorama, format)?,
        PanoramaCommand::DeviceGroups => device_groups(panorama, format)?,
        PanoramaCommand::Hierarchy => hierarchy(panorama, format)?,
        PanoramaCommand::Tags { tag } => tags(panorama, tag.as_deref(), format).await?,
    };
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn devices(panorama: &PanoramaSession, format: OutputFormat) -> Result<String, CliError> {
    let views: Vec<DeviceView> = panorama
        .managed_devices()?
        .into_iter()
        .map(DeviceView::from)
        .collect();
    let color = output::should_color();
    output::render_list(
        format,
        &views,
        |d| DeviceRow {
            serial: d.serial.clone(),
            hostname: d.hostname.clone(),
            address: d.address.clone(),
            ha: output::ha_state(d.ha_state, color),
            vsys: d
                .vsys
                .iter()
                .map(|v| format!("{} ({})", v.name, v.display_name))
                .collect::<Vec<_>>()
                .join(", "),
        },
        |d| d.serial.clone(),
    )
}

fn device_groups(panorama: &PanoramaSession, format: OutputFormat) -> Result<String, CliError> {
    let views: Vec<DeviceGroupView> = panorama
        .device_groups()
        .into_iter()
        .map(DeviceGroupView::from)
        .collect();
    output::render_list(
        format,
        &views,
        |g| DeviceGroupRow {
            name: g.name.clone(),
            targets: g
                .targets
                .iter()
                .map(|t| match t.vsys {
                    Some(ref vsys) => format!("{}/{vsys}", t.device),
                    None => t.device.clone(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        },
        |g| g.name.clone(),
    )
}

fn tree_lines(nodes: &[DeviceGroupNode], depth: usize, out: &mut Vec<String>) {
    for node in nodes {
        out.push(format!("{}{}", "  ".repeat(depth), node.name));
        tree_lines(&node.children, depth + 1, out);
    }
}

fn hierarchy(panorama: &PanoramaSession, format: OutputFormat) -> Result<String, CliError> {
    let hierarchy = panorama.hierarchy();
    let map = panorama.hierarchy_map();
    output::render_single(
        format,
        &map,
        |_| {
            let mut lines = Vec::new();
            tree_lines(hierarchy.roots(), 0, &mut lines);
            lines.join("\n")
        },
        |_| hierarchy.names().join("\n"),
    )
}

async fn tags(
    panorama: &PanoramaSession,
    tag: Option<&str>,
    format: OutputFormat,
) -> Result<String, CliError> {
    if let Some(tag) = tag {
        let devices: Vec<String> = panorama
            .device_serials_with_tag(tag, None)
            .await?
            .into_iter()
            .collect();
        return output::render_list(
            format,
            &devices,
            |d| TagRow {
                device: d.clone(),
                tags: tag.to_owned(),
            },
            Clone::clone,
        );
    }

    let views: Vec<TagView> = panorama
        .tags_by_device(None)
        .await?
        .into_iter()
        .map(|(device, tags)| TagView { device, tags })
        .collect();
    output::render_list(
        format,
        &views,
        |v| TagRow {
            device: v.device.clone(),
            tags: v.tags.join(", "),
        },
        |v| format!("{}\t{}", v.device, v.tags.join(",")),
    )
}
