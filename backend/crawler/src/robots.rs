/// Minimal `robots.txt` evaluation: a flat list of `Disallow` prefixes
/// under the `User-agent: *` group (or a group matching our own agent).
/// Good enough for the county sites in scope; it does not attempt
/// wildcard/`$`-anchor extensions.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    disallow: Vec<String>,
}

impl RobotsPolicy {
    pub fn parse(body: &str, user_agent: &str) -> Self {
        let mut disallow = Vec::new();
        let mut in_relevant_group = false;
        let mut any_group_matched = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else { continue };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    let matches = value == "*" || user_agent.to_ascii_lowercase().contains(&value.to_ascii_lowercase());
                    if matches {
                        any_group_matched = true;
                    }
                    in_relevant_group = matches;
                }
                "disallow" if in_relevant_group && !value.is_empty() => {
                    disallow.push(value.to_string());
                }
                _ => {}
            }
        }

        let _ = any_group_matched;
        Self { disallow }
    }

    pub fn allows(&self, path: &str) -> bool {
        !self.disallow.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disallowed_path_is_rejected() {
        let policy = RobotsPolicy::parse("User-agent: *\nDisallow: /private\n", "flexion-crawler");
        assert!(!policy.allows("/private/records"));
        assert!(policy.allows("/public/calendar"));
    }

    #[test]
    fn empty_robots_allows_everything() {
        let policy = RobotsPolicy::parse("", "flexion-crawler");
        assert!(policy.allows("/anything"));
    }
}
