//! Security rule command handlers.

use panos_api::xpath::{self, RuleType, RulebaseType};
use panos_core::{CoreError, DeviceSession, RuleKey, SecurityRule};
use serde::{Serialize, Serializer};
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat, RuleLocation, Rulebase, RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

/// Which kind of device the rules are read from.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    Gateway,
    Panorama,
}

/// XPath of the security rules container, or of one rule when `name` is
/// given.
fn rules_xpath(scope: Scope, location: &RuleLocation, name: Option<&str>) -> String {
    match scope {
        Scope::Gateway => format!(
            "{}{}{}",
            xpath::this_device(),
            xpath::vsys(Some(&location.vsys)),
            xpath::rule(RulebaseType::Local, RuleType::Security, name)
        ),
        Scope::Panorama => {
            let rulebase = match location.rulebase {
                Rulebase::Pre => RulebaseType::Pre,
                Rulebase::Post => RulebaseType::Post,
            };
            format!(
                "{}{}",
                xpath::location(&location.device_group),
                xpath::rule(rulebase, RuleType::Security, name)
            )
        }
    }
}

/// Serializes as the rule document.
struct RuleView<'a>(&'a SecurityRule);

impl Serialize for RuleView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.to_document().serialize(serializer)
    }
}

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Destination")]
    destination: String,
    #[tabled(rename = "Application")]
    application: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
}

fn joined(rule: &SecurityRule, key: RuleKey) -> String {
    rule.get_list(key).join(", ")
}

fn rule_row(rule: &SecurityRule) -> RuleRow {
    RuleRow {
        name: rule.name().unwrap_or_default().to_owned(),
        action: rule.get_text(RuleKey::Action),
        from: joined(rule, RuleKey::FromZoneList),
        to: joined(rule, RuleKey::ToZoneList),
        source: joined(rule, RuleKey::SourceList),
        destination: joined(rule, RuleKey::DestinationList),
        application: joined(rule, RuleKey::ApplicationList),
        service: joined(rule, RuleKey::ServiceList),
        disabled: rule.get_text(RuleKey::Disabled),
    }
}

fn rule_detail(rule: &SecurityRule) -> String {
    let mut fields = vec![
        ("Name", rule.name().unwrap_or_default().to_owned()),
        ("UUID", rule.uuid().unwrap_or("-").to_owned()),
        ("Location", rule.device_group()),
        ("Action", rule.get_text(RuleKey::Action)),
        ("From", joined(rule, RuleKey::FromZoneList)),
        ("To", joined(rule, RuleKey::ToZoneList)),
        ("Source", joined(rule, RuleKey::SourceList)),
        ("Source user", joined(rule, RuleKey::SourceUserList)),
        ("Destination", joined(rule, RuleKey::DestinationList)),
        ("Application", joined(rule, RuleKey::ApplicationList)),
        ("Service", joined(rule, RuleKey::ServiceList)),
        ("Tags", joined(rule, RuleKey::TagList)),
        ("Disabled", rule.get_text(RuleKey::Disabled)),
        ("Description", rule.get_text(RuleKey::Description)),
        ("Log setting", rule.get_text(RuleKey::LogSetting)),
    ];
    if rule.has_key(RuleKey::ProfileSettingGroup) {
        fields.push(("Profile group", joined(rule, RuleKey::ProfileSettingGroup)));
    }
    let devices = rule.target_devices();
    if !devices.is_empty() {
        let targets = devices
            .iter()
            .map(|d| match d.vsys.as_slice() {
                [] => d.serial.clone(),
                vsys => format!("{} ({})", d.serial, vsys.join(", ")),
            })
            .collect::<Vec<_>>()
            .join(", ");
        fields.push(("Target devices", targets));
    }
    let tags = rule.target_tags();
    if !tags.is_empty() {
        fields.push(("Target tags", tags.join(", ")));
    }
    if rule.target_negated() {
        fields.push(("Target negated", "yes".into()));
    }
    output::detail_lines(&fields)
}

pub async fn handle<S: DeviceSession>(
    session: &S,
    scope: Scope,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let rendered = match args.command {
        RulesCommand::List { location } => {
            let rules = session
                .security_rules(&rules_xpath(scope, &location, None))
                .await?;
            list(&rules, global.output)?
        }

        RulesCommand::Show { name, location } => {
            let rule = session
                .security_rules(&rules_xpath(scope, &location, Some(&name)))
                .await?
                .into_iter()
                .find(|r| r.name() == Some(name.as_str()))
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "rule".into(),
                    identifier: name.clone(),
                    list_command: "rules list".into(),
                })?;
            show(&rule, global.output)?
        }
    };

    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn list(rules: &[SecurityRule], format: OutputFormat) -> Result<String, CliError> {
    let views: Vec<RuleView<'_>> = rules.iter().map(RuleView).collect();
    output::render_list(
        format,
        &views,
        |v| rule_row(v.0),
        |v| v.0.name().unwrap_or_default().to_owned(),
    )
}

fn show(rule: &SecurityRule, format: OutputFormat) -> Result<String, CliError> {
    if let OutputFormat::Plain = format {
        return Ok(rule.to_xml_string().map_err(CoreError::from)?);
    }
    output::render_single(
        format,
        &RuleView(rule),
        |v| rule_detail(v.0),
        |v| v.0.name().unwrap_or_default().to_owned(),
    )
}
