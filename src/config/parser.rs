use super::settings::AppConfig;

impl AppConfig {
    /// Parse the simple KEY="VALUE" config format.
    pub(crate) fn parse_ini(&mut self, contents: &str) {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim().trim_matches('"');

                match key {
                    "PORT" => {
                        if let Ok(v) = value.parse() {
                            self.port = v;
                        }
                    }
                    "POLL_INTERVAL" => {
                        if let Ok(v) = value.parse() {
                            self.poll_interval_secs = v;
                        }
                    }
                    "KUBELET_PODS_PATH" => {
                        if !value.is_empty() {
                            self.kubelet_pods_path = value.to_string();
                        }
                    }
                    "NODE_NAME" => {
                        self.node_name = Some(value.to_string()).filter(|v| !v.is_empty());
                    }
                    "EVENT_COMPONENT" => {
                        if !value.is_empty() {
                            self.event_component = value.to_string();
                        }
                    }
                    _ => {} // Ignore unknown keys
                }
            }
        }
    }
}
