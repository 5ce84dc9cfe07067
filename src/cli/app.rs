use super::args::{Cli, Command, FailoverAction, RemediationArg};
use super::output::{
    print_json, render_details, render_stats, render_suggestions, render_topology,
};
use anyhow::{Context, Result, anyhow, bail};
use cartridge_admin::{
    AdminConsole, ApplyOutcome, ConsoleConfig, CreateReplicasetArgs, EditReplicasetArgs,
    FailoverConfig, FailoverMode, InMemoryGateway, PromoteLeaderArgs, RemediationKind,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

impl From<RemediationArg> for RemediationKind {
    fn from(arg: RemediationArg) -> Self {
        match arg {
            RemediationArg::RestartReplication => RemediationKind::RestartReplication,
            RemediationArg::ForceApply => RemediationKind::ForceConfigReapply,
            RemediationArg::DisableServers => RemediationKind::DisableServers,
        }
    }
}

/// Resolves the connection settings: flags override `CARTRIDGE_ADMIN_*`.
pub fn build_config(cli: &Cli) -> Result<ConsoleConfig> {
    let mut config = match &cli.url {
        Some(url) => ConsoleConfig::from_url(url).map_err(|e| anyhow!(e))?,
        None => ConsoleConfig::from_env()
            .map_err(|e| anyhow!(e))
            .context("No endpoint given; pass --url or set the environment")?,
    };
    if let Some(user) = &cli.user {
        config.username = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        config.password = Some(password.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }
    config = config.with_stats(!cli.no_stats);
    config.validate().map_err(|e| anyhow!(e))?;
    Ok(config)
}

fn open_console(cli: &Cli) -> Result<AdminConsole> {
    if cli.demo {
        return Ok(AdminConsole::with_gateway(Arc::new(InMemoryGateway::demo())));
    }
    let config = build_config(cli)?;
    AdminConsole::connect(&config).context("Failed to set up the admin gateway")
}

fn report<T: serde::Serialize>(cli: &Cli, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if cli.json {
        print_json(value)
    } else {
        print!("{}", text());
        Ok(())
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let console = open_console(&cli)?;

    match &cli.command {
        Command::List => {
            let snapshot = console.refresh().await.context("Failed to load topology")?;
            report(&cli, snapshot.as_ref(), || render_topology(&snapshot))
        }
        Command::Stat => {
            let snapshot = console.refresh().await.context("Failed to load topology")?;
            let stats = console
                .store()
                .refresh_server_stat()
                .await
                .context("Failed to load statistics")?;
            report(&cli, &stats, || render_stats(&snapshot, &stats))
        }
        Command::Details { uuid } => {
            let details = console
                .store()
                .server_details(uuid)
                .await
                .with_context(|| format!("Failed to load details of '{}'", uuid))?;
            report(&cli, &details, || render_details(&details))
        }
        Command::Probe { uri } => {
            let ok = console.topology().probe(uri).await?;
            report(&cli, &json!({ "probe_server": ok }), || {
                format!("probe {}: {}\n", uri, if ok { "ok" } else { "failed" })
            })
        }
        Command::Join { uri, replicaset } => {
            console.refresh().await?;
            let ack = console.topology().join_server(uri, replicaset).await?;
            report(&cli, &ack, || format!("joined {} as {}\n", uri, ack.servers.join(", ")))
        }
        Command::Expel { uuid } => {
            console.refresh().await?;
            let ack = console.topology().expel_server(uuid).await?;
            report(&cli, &ack, || format!("expelled {}\n", uuid))
        }
        Command::Disable { uuid } | Command::Enable { uuid } => {
            let disable = matches!(cli.command, Command::Disable { .. });
            console.refresh().await?;
            let ack = console.topology().disable_server(uuid, disable).await?;
            report(&cli, &ack, || {
                format!("{} {}\n", if disable { "disabled" } else { "enabled" }, uuid)
            })
        }
        Command::CreateReplicaset {
            alias,
            roles,
            vshard_group,
            weight,
            all_rw,
            servers,
        } => {
            console.refresh().await?;
            let ack = console
                .topology()
                .create_replicaset(CreateReplicasetArgs {
                    alias: alias.clone(),
                    roles: roles.clone(),
                    vshard_group: vshard_group.clone(),
                    weight: *weight,
                    all_rw: all_rw.then_some(true),
                    join_servers: servers.clone(),
                })
                .await?;
            report(&cli, &ack, || {
                format!("created replicaset {}\n", ack.replicasets.join(", "))
            })
        }
        Command::EditReplicaset {
            uuid,
            alias,
            roles,
            vshard_group,
            weight,
            all_rw,
            master,
            priority,
        } => {
            console.refresh().await?;
            let ack = console
                .topology()
                .edit_replicaset(EditReplicasetArgs {
                    uuid: uuid.clone(),
                    alias: alias.clone(),
                    roles: (!roles.is_empty()).then(|| roles.clone()),
                    vshard_group: vshard_group.clone(),
                    weight: *weight,
                    all_rw: *all_rw,
                    failover_priority: (!priority.is_empty()).then(|| priority.clone()),
                    master: master.clone(),
                })
                .await?;
            report(&cli, &ack, || format!("edited replicaset {}\n", uuid))
        }
        Command::Bootstrap => {
            let ok = console.topology().bootstrap_vshard().await?;
            report(&cli, &json!({ "bootstrap_vshard": ok }), || {
                "vshard bootstrapped\n".to_string()
            })
        }
        Command::Failover { action } => run_failover(&cli, &console, action).await,
        Command::Suggestions => {
            let snapshot = console.refresh().await?;
            report(&cli, &snapshot.suggestions, || render_suggestions(&snapshot))
        }
        Command::Remediate { kind } => run_remediation(&cli, &console, (*kind).into()).await,
        Command::UploadConfig { path } => {
            console
                .upload_config_file(path)
                .await
                .with_context(|| format!("Failed to upload '{}'", path.display()))?;
            report(&cli, &json!({ "uploaded": path.display().to_string() }), || {
                format!("uploaded {}\n", path.display())
            })
        }
    }
}

async fn run_failover(cli: &Cli, console: &AdminConsole, action: &FailoverAction) -> Result<()> {
    match action {
        FailoverAction::Get => {
            let config = console.failover().get_failover().await?;
            report(cli, &config, || {
                format!(
                    "mode: {}\nstate provider: {}\n",
                    config.mode,
                    config.state_provider.as_deref().unwrap_or("none")
                )
            })
        }
        FailoverAction::Set {
            mode,
            state_provider,
            failover_timeout,
            fencing,
            provider_params,
        } => {
            let mode: FailoverMode = mode.parse()?;
            let mut config = FailoverConfig::with_mode(mode);
            config.state_provider = state_provider.clone();
            config.failover_timeout = *failover_timeout;
            config.fencing_enabled = *fencing;
            if let Some(raw) = provider_params {
                let params: Value = serde_json::from_str(raw)
                    .context("--provider-params must be a JSON object")?;
                match state_provider.as_deref() {
                    Some("tarantool") => config.tarantool_params = Some(params),
                    Some("etcd2") => config.etcd2_params = Some(params),
                    _ => bail!("--provider-params needs --state-provider tarantool or etcd2"),
                }
            }
            let cluster = console.failover().change_failover(config).await?;
            report(cli, &cluster, || {
                let mode = cluster
                    .failover_params
                    .as_ref()
                    .map(|params| params.mode.clone())
                    .unwrap_or_default();
                format!("failover mode is now {}\n", mode)
            })
        }
        FailoverAction::Promote {
            replicaset,
            instance,
            force,
        } => {
            let ok = console
                .failover()
                .promote_failover_leader(PromoteLeaderArgs {
                    replicaset_uuid: replicaset.clone(),
                    instance_uuid: instance.clone(),
                    force_inconsistency: *force,
                })
                .await?;
            report(cli, &json!({ "failover_promote": ok }), || {
                format!("promoted {} in {}\n", instance, replicaset)
            })
        }
    }
}

async fn run_remediation(cli: &Cli, console: &AdminConsole, kind: RemediationKind) -> Result<()> {
    console.refresh().await.context("Failed to load topology")?;
    let controller = console.remediation(kind);
    let state = controller.open()?;
    if !cli.json {
        println!("{}: {}", kind.title(), kind.description());
        for target in &state.suggestions {
            println!("    {}", target.label);
        }
    }

    match console.apply_remediation(kind).await? {
        ApplyOutcome::Applied => report(cli, &json!({ "applied": kind }), || {
            format!("{}: done\n", kind.title())
        }),
        ApplyOutcome::Failed(err) => {
            let _ = controller.close();
            Err(anyhow!(err)).context(format!("{} failed", kind.title()))
        }
        ApplyOutcome::Ignored | ApplyOutcome::Stale => {
            bail!("{} was not submitted", kind.title())
        }
    }
}
