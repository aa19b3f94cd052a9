//! Machine-config name derivation
//!
//! Pure string assembly, no state. The same suffix (base, optional, custom)
//! is appended both to every nodepool's config list and, once, to the
//! cluster-level `mcFiles` manifest.
//!
//! Garbage in, garbage out: an empty vendor id yields an odd-looking name
//! rather than an error. Shape validation belongs to the caller.

use super::registry::MaxPods;

/// Time sync config applied to every worker
pub const WORKERS_CHRONY: &str = "workers-chrony-configuration";

/// Kubelet config for the standard density
pub const KUBELET_CONFIG_STANDARD: &str = "worker-kubeletconfig";

/// Kubelet config for the high density
pub const KUBELET_CONFIG_HIGH_DENSITY: &str = "worker-kubeletconfig-500";

/// Larger container storage; mandatory at high density
pub const VAR_LIB_CONTAINERS: &str = "98-var-lib-containers";

/// NIC ring buffer tuning
pub const RINGSIZE: &str = "ringsize";

/// Options shared by nodepool and manifest lists
#[derive(Debug, Clone, Copy)]
pub struct ConfigOptions<'a> {
    pub max_pods: MaxPods,
    pub include_var_lib_containers: bool,
    pub include_ringsize: bool,
    pub custom_configs: &'a [String],
}

impl<'a> ConfigOptions<'a> {
    pub fn new(max_pods: MaxPods) -> Self {
        Self {
            max_pods,
            include_var_lib_containers: false,
            include_ringsize: false,
            custom_configs: &[],
        }
    }

    /// Whether the var-lib-containers config ends up in the output
    pub fn needs_var_lib_containers(&self) -> bool {
        self.include_var_lib_containers || self.max_pods.is_high_density()
    }
}

pub fn kubelet_config_name(max_pods: MaxPods) -> &'static str {
    match max_pods {
        MaxPods::Standard => KUBELET_CONFIG_STANDARD,
        MaxPods::HighDensity => KUBELET_CONFIG_HIGH_DENSITY,
    }
}

/// `[chrony, kubelet(max_pods)]`
pub fn base_configs(max_pods: MaxPods) -> Vec<String> {
    vec![
        WORKERS_CHRONY.to_string(),
        kubelet_config_name(max_pods).to_string(),
    ]
}

pub fn nm_conf_name(cluster_name: &str, vendor: &str) -> String {
    format!("nm-conf-{cluster_name}-{vendor}")
}

/// Base, optional, then custom names: the part shared by every list
fn shared_suffix(options: &ConfigOptions<'_>) -> Vec<String> {
    let mut configs = base_configs(options.max_pods);

    if options.needs_var_lib_containers() {
        configs.push(VAR_LIB_CONTAINERS.to_string());
    }
    if options.include_ringsize {
        configs.push(RINGSIZE.to_string());
    }

    configs.extend(
        options
            .custom_configs
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    );

    configs
}

/// Config names attached to one vendor's nodepool
pub fn per_nodepool_configs(
    cluster_name: &str,
    vendor: &str,
    options: &ConfigOptions<'_>,
) -> Vec<String> {
    let mut configs = vec![nm_conf_name(cluster_name, vendor)];
    configs.extend(shared_suffix(options));
    configs
}

/// Cluster-level manifest: one nm-conf per vendor (in order, not deduplicated)
/// followed by each shared config exactly once
pub fn mc_files<S: AsRef<str>>(
    cluster_name: &str,
    vendors: &[S],
    options: &ConfigOptions<'_>,
) -> Vec<String> {
    let mut files: Vec<String> = vendors
        .iter()
        .map(|v| nm_conf_name(cluster_name, v.as_ref()))
        .collect();
    files.extend(shared_suffix(options));
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_configs_switch_on_density() {
        assert_eq!(
            base_configs(MaxPods::Standard),
            vec!["workers-chrony-configuration", "worker-kubeletconfig"]
        );
        assert_eq!(
            base_configs(MaxPods::HighDensity),
            vec!["workers-chrony-configuration", "worker-kubeletconfig-500"]
        );
    }

    #[test]
    fn test_nm_conf_name() {
        assert_eq!(nm_conf_name("c1", "dell-data"), "nm-conf-c1-dell-data");
        assert_eq!(nm_conf_name("c1", ""), "nm-conf-c1-");
    }

    #[test]
    fn test_per_nodepool_standard() {
        let options = ConfigOptions::new(MaxPods::Standard);
        assert_eq!(
            per_nodepool_configs("c1", "dell", &options),
            vec![
                "nm-conf-c1-dell",
                "workers-chrony-configuration",
                "worker-kubeletconfig"
            ]
        );
    }

    #[test]
    fn test_high_density_forces_var_lib() {
        let options = ConfigOptions::new(MaxPods::HighDensity);
        assert!(!options.include_var_lib_containers);

        let configs = per_nodepool_configs("c1", "dell", &options);
        assert_eq!(configs.last().map(String::as_str), Some(VAR_LIB_CONTAINERS));
        assert!(configs.contains(&KUBELET_CONFIG_HIGH_DENSITY.to_string()));
    }

    #[test]
    fn test_optional_then_custom_order() {
        let custom = vec![
            "  net-tuning ".to_string(),
            "   ".to_string(),
            "".to_string(),
            "audit".to_string(),
        ];
        let options = ConfigOptions {
            max_pods: MaxPods::Standard,
            include_var_lib_containers: true,
            include_ringsize: true,
            custom_configs: &custom,
        };
        assert_eq!(
            per_nodepool_configs("c1", "cisco", &options),
            vec![
                "nm-conf-c1-cisco",
                "workers-chrony-configuration",
                "worker-kubeletconfig",
                "98-var-lib-containers",
                "ringsize",
                "net-tuning",
                "audit",
            ]
        );
    }

    #[test]
    fn test_mc_files_one_nm_conf_per_vendor() {
        let options = ConfigOptions::new(MaxPods::Standard);
        let files = mc_files("c1", &["dell", "cisco", "dell"], &options);
        assert_eq!(
            files,
            vec![
                "nm-conf-c1-dell",
                "nm-conf-c1-cisco",
                "nm-conf-c1-dell",
                "workers-chrony-configuration",
                "worker-kubeletconfig",
            ]
        );
    }

    #[test]
    fn test_custom_configs_not_deduplicated() {
        let custom = vec![RINGSIZE.to_string()];
        let options = ConfigOptions {
            max_pods: MaxPods::Standard,
            include_var_lib_containers: false,
            include_ringsize: true,
            custom_configs: &custom,
        };
        let files = mc_files("c1", &["dell"], &options);
        assert_eq!(files.iter().filter(|f| *f == RINGSIZE).count(), 2);
    }
}
