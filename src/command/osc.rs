//! Renders OSC commands into interpreter commands

use super::ExecutableCommand;
use crate::config::OscConfig;
use crate::descriptor::OscCommand;

/// Turns descriptor OSC commands into `Send-OscMessage` invocations
#[derive(Debug, Clone)]
pub struct OscTemplate {
    config: OscConfig,
}

impl OscTemplate {
    pub fn new(config: OscConfig) -> Self {
        Self { config }
    }

    /// Interpreter command text for one OSC message
    pub fn render(&self, command: &OscCommand) -> String {
        let port = if self.config.use_command_port {
            command.port
        } else {
            self.config.port
        };
        let arguments = command
            .values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "\nImport-Module {}\nSend-OscMessage -IPAddress \"{}\" -Port {} -AddressPattern {} -Arguments @({})\n",
            self.config.module, self.config.host, port, command.path, arguments
        )
    }

    /// Render a whole list, preserving order
    pub fn render_all(&self, commands: &[OscCommand]) -> Vec<ExecutableCommand> {
        commands
            .iter()
            .map(|cmd| ExecutableCommand::Inline(self.render(cmd)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::OscValue;

    fn osc(path: &str, values: Vec<OscValue>, port: u16) -> OscCommand {
        OscCommand {
            path: path.to_string(),
            values,
            port,
        }
    }

    #[test]
    fn test_render_uses_fixed_target() {
        let template = OscTemplate::new(OscConfig::default());
        let cmd = osc(
            "/cue/go",
            vec![OscValue::Text("main".to_string()), OscValue::Number(3u64.into())],
            9999,
        );

        let rendered = template.render(&cmd);
        assert!(rendered.contains("Import-Module SendOscModule\n"));
        assert!(rendered.contains(
            r#"Send-OscMessage -IPAddress "127.0.0.1" -Port 8000 -AddressPattern /cue/go -Arguments @(main,3)"#
        ));
    }

    #[test]
    fn test_render_can_use_command_port() {
        let template = OscTemplate::new(OscConfig {
            use_command_port: true,
            ..OscConfig::default()
        });
        let rendered = template.render(&osc("/x", vec![], 9001));
        assert!(rendered.contains("-Port 9001 "));
        assert!(rendered.contains("-Arguments @()"));
    }

    #[test]
    fn test_render_all_keeps_order() {
        let template = OscTemplate::new(OscConfig::default());
        let rendered = template.render_all(&[osc("/a", vec![], 1), osc("/b", vec![], 1)]);
        assert_eq!(rendered.len(), 2);
        assert!(matches!(&rendered[0], ExecutableCommand::Inline(s) if s.contains("/a")));
        assert!(matches!(&rendered[1], ExecutableCommand::Inline(s) if s.contains("/b")));
    }
}
