use anyhow::{Context, Result, anyhow, bail};
use vehicle_panel::api::HttpVehicleApi;
use vehicle_panel::dispatch::{ChannelHost, HostCommand};
use vehicle_panel::logging::{get_logger, init_logging};
use vehicle_panel::{PanelConfig, PanelEvent, VehicleApi, VehiclePanel, VehicleSummary};

const USAGE: &str = "usage: vehicle-panel [--config PATH] [--press CONTROL] ID...
controls: lock | unlock | charge | disconnect | disconnect-all | select:ID | set:PROPERTY=VALUE";

struct CliArgs {
    config: Option<String>,
    press: Option<PanelEvent>,
    ids: Vec<String>,
}

impl CliArgs {
    fn parse<I: Iterator<Item = String>>(mut args: I) -> Result<Self> {
        let mut config = None;
        let mut press = None;
        let mut ids = Vec::new();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => config = Some(args.next().context("--config needs a path")?),
                "--press" => {
                    let control = args.next().context("--press needs a control")?;
                    press = Some(parse_control(&control)?);
                }
                "-h" | "--help" => bail!(USAGE),
                _ => ids.push(arg),
            }
        }
        if ids.is_empty() {
            bail!(USAGE);
        }
        Ok(Self { config, press, ids })
    }
}

fn parse_control(control: &str) -> Result<PanelEvent> {
    Ok(match control {
        "lock" => PanelEvent::Lock,
        "unlock" => PanelEvent::Unlock,
        "charge" => PanelEvent::ToggleCharge,
        "disconnect" => PanelEvent::Disconnect,
        "disconnect-all" => PanelEvent::DisconnectAll,
        other => {
            if let Some(id) = other.strip_prefix("select:") {
                PanelEvent::SelectVehicle(id.to_string())
            } else if let Some((target, value)) =
                other.strip_prefix("set:").and_then(|s| s.split_once('='))
            {
                PanelEvent::CommitSetting {
                    target_property: target.to_string(),
                    value: value.to_string(),
                }
            } else {
                return Err(anyhow!("unknown control '{}'\n{}", other, USAGE));
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => PanelConfig::from_file(path)?,
        None => PanelConfig::load()?,
    };
    config.validate()?;
    init_logging(&config.logging)?;
    let logger = get_logger("main");

    let api = HttpVehicleApi::new(&config.api)?;
    let mut statuses = Vec::with_capacity(args.ids.len());
    for id in &args.ids {
        statuses.push(api.get_vehicle(id).await?);
    }
    let vehicles: Vec<VehicleSummary> = statuses.iter().map(|s| s.summary()).collect();
    let mut selected = statuses
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("no vehicle fetched"))?;

    let mut panel = VehiclePanel::from_config(&config);
    panel.render(&selected, &vehicles);

    if let Some(event) = args.press {
        let (mut host, mut rx) = ChannelHost::channel();
        if let Some(ticket) = panel.handle_event(event, &selected, &vehicles, &mut host)? {
            panel.run_switch(&ticket, &api, &mut host).await;
        }
        drop(host);

        let mut refresh = false;
        while let Some(cmd) = rx.recv().await {
            refresh |= matches!(cmd, HostCommand::UpdateProperty { .. });
            if let Some(status) = cmd.execute(&api, &selected.id).await? {
                selected = status;
            }
        }
        if refresh {
            selected = api.get_vehicle(&selected.id).await?;
        }
    }

    let view = panel.render(&selected, &vehicles);
    println!("{}", serde_json::to_string_pretty(&view)?);
    logger.debug("Done");
    Ok(())
}
