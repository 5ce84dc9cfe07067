//! GraphQL documents sent to the cluster admin API.

use super::Operation;

pub const SERVER_LIST: &str = r#"query serverList($withStats: Boolean!) {
  serverList: servers {
    uuid alias uri status message disabled priority
    replicaset { uuid }
    labels { name value }
    boxinfo { general { ro } }
  }
  replicasetList: replicasets {
    uuid alias status roles vshard_group weight all_rw
    master { uuid }
    active_master { uuid }
    servers {
      uuid alias uri status message disabled priority
      replicaset { uuid }
      labels { name value }
      boxinfo { general { ro } }
    }
  }
  serverStat: servers @include(if: $withStats) {
    uuid
    uri
    statistics { quota_size arena_used items_used vshard_buckets_count quota_used_ratio arena_used_ratio items_used_ratio }
  }
  cluster {
    suggestions {
      refine_uri { uuid uri_old uri_new }
      force_apply { uuid config_mismatch config_locked operation_error }
      disable_servers { uuid }
      restart_replication { uuid }
    }
    issues { level replicaset_uuid instance_uuid message topic }
  }
}
"#;

pub const SERVER_STAT: &str = r#"query serverStat {
  serverStat: servers {
    uuid
    uri
    statistics { quota_size arena_used items_used vshard_buckets_count quota_used_ratio arena_used_ratio items_used_ratio }
  }
}
"#;

pub const SERVER_DETAILS: &str = r#"query serverDetails($uuid: String) {
  servers(uuid: $uuid) {
    alias
    status
    message
    uri
    replicaset { roles active_master { uuid } master { uuid } }
    labels { name value }
    boxinfo {
      cartridge { version state error }
      general { version pid uptime instance_uuid replicaset_uuid ro }
      network { io_collect_interval net_msg_max readahead }
      replication { replication_connect_quorum replication_connect_timeout replication_sync_lag replication_sync_timeout replication_timeout vclock replication_info { id uuid lsn upstream_status upstream_message upstream_idle upstream_peer upstream_lag downstream_status downstream_message } }
      storage { wal_max_size vinyl_run_count_per_level rows_per_wal wal_dir_rescan_delay memtx_memory vinyl_memory vinyl_cache vinyl_page_size vinyl_range_size vinyl_read_threads vinyl_write_threads vinyl_timeout vinyl_run_size_ratio vinyl_bloom_fpr too_long_threshold checkpoint_interval checkpoint_count }
    }
  }
  descriptionCartridge: __type(name: "ServerInfoCartridge") { fields { name description } }
  descriptionGeneral: __type(name: "ServerInfoGeneral") { fields { name description } }
  descriptionNetwork: __type(name: "ServerInfoNetwork") { fields { name description } }
  descriptionReplication: __type(name: "ServerInfoReplication") { fields { name description } }
  descriptionStorage: __type(name: "ServerInfoStorage") { fields { name description } }
}
"#;

pub const SERVER_DETAILS_REFRESH: &str = r#"query serverDetailsRefresh($uuid: String) {
  servers(uuid: $uuid) {
    labels { name value }
    boxinfo {
      cartridge { version state error }
      general { version pid uptime instance_uuid replicaset_uuid ro }
      network { io_collect_interval net_msg_max readahead }
      replication { replication_connect_quorum replication_connect_timeout replication_sync_lag replication_sync_timeout replication_timeout vclock }
      storage { memtx_memory vinyl_memory vinyl_cache checkpoint_interval checkpoint_count }
    }
  }
}
"#;

pub const CLUSTER_SELF: &str = r#"query clusterSelf {
  cluster {
    self { uri uuid alias demo_uri state error }
    failover_params { mode state_provider failover_timeout fencing_enabled fencing_timeout fencing_pause tarantool_params { uri password } etcd2_params { prefix lock_delay endpoints username password } }
    known_roles { name dependencies implies_router implies_storage }
    vshard_groups { name bucket_count bootstrapped }
    can_bootstrap_vshard
    vshard_bucket_count
  }
}
"#;

pub const FAILOVER_PARAMS: &str = r#"query getFailoverParams {
  cluster {
    failover_params { mode state_provider failover_timeout fencing_enabled fencing_timeout fencing_pause tarantool_params { uri password } etcd2_params { prefix lock_delay endpoints username password } }
  }
}
"#;

pub const EDIT_TOPOLOGY: &str = r#"mutation editTopology($replicasets: [EditReplicasetInput], $servers: [EditServerInput]) {
  cluster {
    edit_topology(replicasets: $replicasets, servers: $servers) {
      replicasets { uuid }
      servers { uuid }
    }
  }
}
"#;

pub const PROBE_SERVER: &str = r#"mutation probe($uri: String!) {
  probe_server(uri: $uri)
}
"#;

pub const BOOTSTRAP_VSHARD: &str = r#"mutation bootstrap {
  bootstrap_vshard
}
"#;

pub const CHANGE_FAILOVER: &str = r#"mutation changeFailover($mode: String, $state_provider: String, $failover_timeout: Float, $fencing_enabled: Boolean, $fencing_timeout: Float, $fencing_pause: Float, $tarantool_params: FailoverStateProviderCfgInputTarantool, $etcd2_params: FailoverStateProviderCfgInputEtcd2) {
  cluster {
    failover_params(mode: $mode, state_provider: $state_provider, failover_timeout: $failover_timeout, fencing_enabled: $fencing_enabled, fencing_timeout: $fencing_timeout, fencing_pause: $fencing_pause, tarantool_params: $tarantool_params, etcd2_params: $etcd2_params) {
      mode
    }
  }
}
"#;

pub const PROMOTE_FAILOVER_LEADER: &str = r#"mutation promoteFailoverLeader($replicaset_uuid: String!, $instance_uuid: String!, $force_inconsistency: Boolean) {
  cluster {
    failover_promote(replicaset_uuid: $replicaset_uuid, instance_uuid: $instance_uuid, force_inconsistency: $force_inconsistency)
  }
}
"#;

pub const DISABLE_SERVERS: &str = r#"mutation disableServers($uuids: [String!]) {
  cluster {
    disable_servers(uuids: $uuids) { uuid disabled }
  }
}
"#;

pub const RESTART_REPLICATION: &str = r#"mutation restartReplication($uuids: [String!]) {
  cluster {
    restart_replication(uuids: $uuids)
  }
}
"#;

pub const CONFIG_FORCE_REAPPLY: &str = r#"mutation configForceReapply($uuids: [String]) {
  cluster {
    config_force_reapply(uuids: $uuids)
  }
}
"#;

pub fn document_for(operation: Operation) -> &'static str {
    match operation {
        Operation::ServerList => SERVER_LIST,
        Operation::ServerStat => SERVER_STAT,
        Operation::ServerDetails => SERVER_DETAILS,
        Operation::ServerDetailsRefresh => SERVER_DETAILS_REFRESH,
        Operation::ClusterSelf => CLUSTER_SELF,
        Operation::FailoverParams => FAILOVER_PARAMS,
        Operation::EditTopology => EDIT_TOPOLOGY,
        Operation::ProbeServer => PROBE_SERVER,
        Operation::BootstrapVshard => BOOTSTRAP_VSHARD,
        Operation::ChangeFailover => CHANGE_FAILOVER,
        Operation::PromoteFailoverLeader => PROMOTE_FAILOVER_LEADER,
        Operation::DisableServers => DISABLE_SERVERS,
        Operation::RestartReplication => RESTART_REPLICATION,
        Operation::ConfigForceReapply => CONFIG_FORCE_REAPPLY,
    }
}
