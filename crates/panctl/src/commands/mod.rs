//! Command dispatch: opens the session a command needs, then hands off to
//! the handler.

pub mod keygen;
pub mod panorama;
pub mod rules;
pub mod system;

use panos_config::DeviceKind;
use panos_core::{GatewayOptions, GatewaySession, PanoramaOptions, PanoramaSession};

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, target: &Target, global: &GlobalOpts) -> Result<(), CliError> {
    match (cmd, target.kind) {
        (Command::System(args), DeviceKind::Gateway) => {
            let gateway = connect_gateway(target).await?;
            system::handle(&gateway, args, global).await
        }
        (Command::System(args), DeviceKind::Panorama) => {
            let panorama = connect_panorama(target, false).await?;
            system::handle(&panorama, args, global).await
        }

        (Command::Panorama(args), DeviceKind::Panorama) => {
            let panorama = connect_panorama(target, panorama::needs_managed_devices(&args)).await?;
            panorama::handle(&panorama, args, global).await
        }
        (Command::Panorama(_), DeviceKind::Gateway) => Err(CliError::WrongDeviceKind {
            command: "panorama".into(),
            required: DeviceKind::Panorama.to_string(),
        }),

        (Command::Rules(args), DeviceKind::Gateway) => {
            let gateway = connect_gateway(target).await?;
            rules::handle(&gateway, rules::Scope::Gateway, args, global).await
        }
        (Command::Rules(args), DeviceKind::Panorama) => {
            let panorama = connect_panorama(target, false).await?;
            rules::handle(&panorama, rules::Scope::Panorama, args, global).await
        }

        // Keygen and Completions are handled before dispatch
        (Command::Keygen(_) | Command::Completions(_), _) => Ok(()),
    }
}

async fn connect_gateway(target: &Target) -> Result<GatewaySession, CliError> {
    let options = GatewayOptions {
        transport: target.transport.clone(),
        ..GatewayOptions::default()
    };
    Ok(GatewaySession::connect(&target.address, &target.device, options).await?)
}

/// Managed firewalls reuse the Panorama credentials unless the profile
/// has its own `managed_devices` section.
async fn connect_panorama(
    target: &Target,
    load_managed_devices: bool,
) -> Result<PanoramaSession, CliError> {
    let device_config = target.managed_devices.clone().unwrap_or_else(|| {
        let mut device = target.device.clone();
        device.ipv4 = None;
        device
    });
    let options = PanoramaOptions {
        load_managed_devices,
        device_config: Some(device_config),
        transport: target.transport.clone(),
        ..PanoramaOptions::default()
    };
    Ok(PanoramaSession::connect(&target.device, options).await?)
}
