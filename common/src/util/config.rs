use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub tapcell: TapcellConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            tapcell: TapcellConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_lef_files")]
    pub lef_files: Vec<String>,
    #[serde(default = "default_def_file")]
    pub def_file: String,
    #[serde(default = "default_output_def")]
    pub output_def: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            lef_files: default_lef_files(),
            def_file: default_def_file(),
            output_def: default_output_def(),
        }
    }
}

/// Master names and spacing for one tapcell run. Distances are in microns; a
/// negative value selects the built-in default.
#[derive(Debug, Clone, Deserialize)]
pub struct TapcellConfig {
    #[serde(default)]
    pub tapcell_master: Option<String>,
    #[serde(default)]
    pub endcap_master: Option<String>,
    #[serde(default = "default_unset_distance")]
    pub distance: f64,
    #[serde(default = "default_unset_distance")]
    pub halo_width_x: f64,
    #[serde(default = "default_unset_distance")]
    pub halo_width_y: f64,
    #[serde(default = "default_tap_prefix")]
    pub tap_prefix: String,
    #[serde(default = "default_endcap_prefix")]
    pub endcap_prefix: String,

    #[serde(default)]
    pub cnrcap_nwin_master: Option<String>,
    #[serde(default)]
    pub cnrcap_nwout_master: Option<String>,
    #[serde(default)]
    pub tap_nwintie_master: Option<String>,
    #[serde(default)]
    pub tap_nwin2_master: Option<String>,
    #[serde(default)]
    pub tap_nwin3_master: Option<String>,
    #[serde(default)]
    pub tap_nwouttie_master: Option<String>,
    #[serde(default)]
    pub tap_nwout2_master: Option<String>,
    #[serde(default)]
    pub tap_nwout3_master: Option<String>,
    #[serde(default)]
    pub incnrcap_nwin_master: Option<String>,
    #[serde(default)]
    pub incnrcap_nwout_master: Option<String>,
}

impl Default for TapcellConfig {
    fn default() -> Self {
        Self {
            tapcell_master: None,
            endcap_master: None,
            distance: default_unset_distance(),
            halo_width_x: default_unset_distance(),
            halo_width_y: default_unset_distance(),
            tap_prefix: default_tap_prefix(),
            endcap_prefix: default_endcap_prefix(),
            cnrcap_nwin_master: None,
            cnrcap_nwout_master: None,
            tap_nwintie_master: None,
            tap_nwin2_master: None,
            tap_nwin3_master: None,
            tap_nwouttie_master: None,
            tap_nwout2_master: None,
            tap_nwout3_master: None,
            incnrcap_nwin_master: None,
            incnrcap_nwout_master: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_image_size")]
    pub image_size: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            image: None,
            image_size: default_image_size(),
        }
    }
}

fn default_lef_files() -> Vec<String> {
    vec!["inputs/tech.lef".to_string()]
}

fn default_def_file() -> String {
    "inputs/floorplan.def".to_string()
}

fn default_output_def() -> String {
    "output/tapcell.def".to_string()
}

fn default_unset_distance() -> f64 {
    -1.0
}

pub fn default_tap_prefix() -> String {
    "TAP_".to_string()
}

pub fn default_endcap_prefix() -> String {
    "PHY_EDGE_".to_string()
}

fn default_image_size() -> u32 {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tapcell]
            tapcell_master = "TAPCELL_X1"
            distance = 20.0
            "#,
        )
        .unwrap();

        assert_eq!(config.tapcell.tapcell_master.as_deref(), Some("TAPCELL_X1"));
        assert_eq!(config.tapcell.distance, 20.0);
        assert!(config.tapcell.halo_width_x < 0.0);
        assert_eq!(config.tapcell.tap_prefix, "TAP_");
        assert_eq!(config.input.def_file, "inputs/floorplan.def");
        assert!(config.output.image.is_none());
    }
}
