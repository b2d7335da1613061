use crate::utils::error::Error;

/// Browser plugins the tracking endpoint recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Plugin {
    Flash,
    Java,
    Director,
    QuickTime,
    RealPlayer,
    Pdf,
    WindowsMedia,
    Gears,
    Silverlight,
}

impl Plugin {
    pub const ALL: [Plugin; 9] = [
        Plugin::Flash,
        Plugin::Java,
        Plugin::Director,
        Plugin::QuickTime,
        Plugin::RealPlayer,
        Plugin::Pdf,
        Plugin::WindowsMedia,
        Plugin::Gears,
        Plugin::Silverlight,
    ];

    pub fn from_name(name: &str) -> Result<Plugin, Error> {
        match name {
            "flash" => Ok(Plugin::Flash),
            "java" => Ok(Plugin::Java),
            "director" => Ok(Plugin::Director),
            "quick_time" => Ok(Plugin::QuickTime),
            "real_player" => Ok(Plugin::RealPlayer),
            "pdf" => Ok(Plugin::Pdf),
            "windows_media" => Ok(Plugin::WindowsMedia),
            "gears" => Ok(Plugin::Gears),
            "silverlight" => Ok(Plugin::Silverlight),
            _ => Err(Error::Configuration(format!(
                "unknown plugin {}, please use one of {:?}",
                name,
                Plugin::ALL.map(Plugin::name)
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Plugin::Flash => "flash",
            Plugin::Java => "java",
            Plugin::Director => "director",
            Plugin::QuickTime => "quick_time",
            Plugin::RealPlayer => "real_player",
            Plugin::Pdf => "pdf",
            Plugin::WindowsMedia => "windows_media",
            Plugin::Gears => "gears",
            Plugin::Silverlight => "silverlight",
        }
    }

    /// Short code used as the wire key for this plugin.
    pub fn short_code(self) -> &'static str {
        match self {
            Plugin::Flash => "fla",
            Plugin::Java => "java",
            Plugin::Director => "dir",
            Plugin::QuickTime => "qt",
            Plugin::RealPlayer => "realp",
            Plugin::Pdf => "pdf",
            Plugin::WindowsMedia => "wma",
            Plugin::Gears => "gears",
            Plugin::Silverlight => "ag",
        }
    }
}
