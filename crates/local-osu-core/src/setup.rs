//! First-run configuration wizard.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{AppConfig, MAX_SCORES_ON_LEADERBOARD};
use crate::utils::path::wsl_path;
use crate::utils::prompt::Prompter;

/// Answer that leaves an optional value unset.
const NONE_ANSWER: &str = "None";
const MIN_API_KEY_LEN: usize = 32;

const OSU_API_DOC: &str = "osu! api key\n\
    Needed throughout the whole server really\n\
    You can find your api key here https://old.ppy.sh/p/api/\n\
    Type `None` if you can't get one (server won't really be able to function)";

const IMGUR_DOC: &str = "Imgur client id\n\
    If you want your screenshots uploaded to imgur on \"shift + screenshot_key\"\n\
    you will have to provide a client id which you can find here https://api.imgur.com/\n\
    Type `None` if you don't want screenshots to be uploaded";

const OSU_DAILY_DOC: &str = "osu! daily api key\n\
    If you want your bancho rank to show up ingame\n\
    you will need this api key which you can find here https://github.com/Adrriii/osudaily-api/wiki\n\
    Type `None` if you want your rank to show as 1 the whole time";

const USERNAME_DOC: &str = "osu! username\n\
    If you want direct working this is needed\n\
    Type `None` if you want direct/bmap downloading not to work";

const PASSWORD_DOC: &str = "osu! password\n\
    If you want direct working this is needed\n\
    Type `None` if you want direct/bmap downloading not to work";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathKey {
    Osu,
    Songs,
    Replay,
    Screenshots,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credential {
    OsuApiKey,
    ImgurClientId,
    OsuDailyApiKey,
    OsuUsername,
    OsuPassword,
}

pub struct SetupWizard<R, W> {
    prompter: Prompter<R, W>,
    using_wsl: bool,
}

impl<R: BufRead, W: Write> SetupWizard<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            prompter: Prompter::new(input, output),
            using_wsl: false,
        }
    }

    /// Translate entered Windows paths through `wslpath` before checking them.
    pub fn using_wsl(mut self, using_wsl: bool) -> Self {
        self.using_wsl = using_wsl;
        self
    }

    pub fn run(mut self) -> io::Result<AppConfig> {
        let mut config = AppConfig::default();
        self.prompter.say("remember to continue click enter!")?;

        for (prompt, key) in [
            ("Please enter your osu! folder path\n>> ", PathKey::Osu),
            (
                "Please enter your songs folder path\n\
                 note you can type `None` if your songs folder is in your osu! folder\n>> ",
                PathKey::Songs,
            ),
            (
                "Please enter your replay folder path\n\
                 note you can type `None` if your replay folder is in your osu! folder\n>> ",
                PathKey::Replay,
            ),
            (
                "Please enter your screenshots folder path\n\
                 note you can type `None` if your screenshots folder is in your osu! folder\n>> ",
                PathKey::Screenshots,
            ),
        ] {
            let value = self.ask_path(prompt)?;
            let slot = match key {
                PathKey::Osu => &mut config.paths.osu_path,
                PathKey::Songs => &mut config.paths.songs,
                PathKey::Replay => &mut config.paths.replay,
                PathKey::Screenshots => &mut config.paths.screenshots,
            };
            *slot = value;
        }

        config.pp_leaderboard = self.prompter.yes(
            "(yes or no)\n\
             Show pp values for each score on leaderboard (PP leaderboards)\n\
             WARNING REALLY SLOW RIGHT NOW SO PLEASE ENTER N\n>> ",
        )?;
        config.ping_user_when_recent_score = self
            .prompter
            .yes("(yes or no)\nHighlight me when I submit any score\n>> ")?;

        if self.prompter.yes("(yes or no)\nmenu icon?\n>> ")? {
            config.menu_icon.image_link = Some(self.prompter.line("image link\n>> ")?);
            config.menu_icon.click_link = Some(self.prompter.line("click link\n>> ")?);
        }

        let prefix = self.prompter.lower_line("command prefix\ndefault: !\n>> ")?;
        if !prefix.is_empty() {
            config.command_prefix = prefix;
        }

        config.show_pp_for_personal_best = self
            .prompter
            .yes("(yes or no)\nShow pp for personal best (fast)\n>> ")?;

        config.amount_of_scores_on_lb = self.ask_leaderboard_size()?;

        config.auto_update = self
            .prompter
            .yes("(yes or no)\nEnable auto updater?\n>> ")?;
        config.disable_funorange_maps = self
            .prompter
            .yes("(yes or no)\nDisable osu!trainer (funorange) maps?\n>> ")?;

        config.seasonal_bgs = self
            .prompter
            .line(
                "Seasonal Backgrounds! (Ingame backgrounds)\n\
                 To apply just paste the link to a background\n\
                 To have multiple separate each link with a comma\n\
                 To have none just click enter\n>> ",
            )?
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        for (doc, key) in [
            (OSU_API_DOC, Credential::OsuApiKey),
            (IMGUR_DOC, Credential::ImgurClientId),
            (OSU_DAILY_DOC, Credential::OsuDailyApiKey),
            (USERNAME_DOC, Credential::OsuUsername),
            (PASSWORD_DOC, Credential::OsuPassword),
        ] {
            let value = self.ask_credential(doc, key)?;
            let slot = match key {
                Credential::OsuApiKey => &mut config.osu_api_key,
                Credential::ImgurClientId => &mut config.imgur_client_id,
                Credential::OsuDailyApiKey => &mut config.osu_daily_api_key,
                Credential::OsuUsername => &mut config.osu_username,
                Credential::OsuPassword => &mut config.osu_password,
            };
            *slot = value;
        }

        Ok(config)
    }

    fn ask_path(&mut self, prompt: &str) -> io::Result<Option<String>> {
        loop {
            let raw = self.prompter.line(prompt)?;
            if raw == NONE_ANSWER {
                return Ok(None);
            }

            let path = if self.using_wsl {
                match wsl_path(&raw) {
                    Ok(path) => path,
                    Err(e) => {
                        debug!("wslpath failed for '{}': {}", raw, e);
                        PathBuf::from(&raw)
                    }
                }
            } else {
                PathBuf::from(&raw)
            };

            if !path.exists() {
                self.prompter.pause("invalid path!\nclick enter to continue")?;
                continue;
            }

            return Ok(Some(path.to_string_lossy().into_owned()));
        }
    }

    fn ask_leaderboard_size(&mut self) -> io::Result<u32> {
        loop {
            let raw = self.prompter.line(&format!(
                "Number of scores shown on leaderboard\nmaximum: {}\n>> ",
                MAX_SCORES_ON_LEADERBOARD
            ))?;
            match raw.parse::<u32>() {
                Ok(n) if (1..=MAX_SCORES_ON_LEADERBOARD).contains(&n) => return Ok(n),
                _ => continue,
            }
        }
    }

    fn ask_credential(&mut self, doc: &str, key: Credential) -> io::Result<Option<String>> {
        loop {
            let value = self.prompter.line(&format!("{}\n>> ", doc))?;
            if value == NONE_ANSWER {
                return Ok(None);
            }

            match key {
                Credential::OsuPassword => {
                    return Ok(Some(format!("{:x}", md5::compute(value.as_bytes()))));
                }
                Credential::OsuApiKey | Credential::OsuDailyApiKey
                    if value.len() < MIN_API_KEY_LEN =>
                {
                    self.prompter
                        .pause("invalid value was entered\nclick enter to retry")?;
                    continue;
                }
                _ => return Ok(Some(value)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    #[test]
    fn test_full_walkthrough() {
        let tmp = tempdir().unwrap();
        let osu = tmp.path().to_string_lossy().into_owned();
        let key = "k".repeat(32);

        let script = [
            "/definitely/not/here", // rejected path
            "",                     // acknowledge
            osu.as_str(),
            "None",
            "None",
            "None",
            "n",
            "yes",
            "y",
            "https://i.imgur.com/icon.png",
            "https://osu.ppy.sh",
            "",
            "no",
            "abc",
            "500",
            "25",
            "y",
            "n",
            "a.png, ,b.png",
            "short",
            "",
            key.as_str(),
            "None",
            "None",
            "cover",
            "password",
        ]
        .join("\n")
            + "\n";

        let config = SetupWizard::new(Cursor::new(script), Vec::new())
            .run()
            .unwrap();

        assert_eq!(config.paths.osu_path.as_deref(), Some(osu.as_str()));
        assert_eq!(config.paths.songs, None);
        assert!(!config.pp_leaderboard);
        assert!(config.ping_user_when_recent_score);
        assert_eq!(
            config.menu_icon.image_link.as_deref(),
            Some("https://i.imgur.com/icon.png")
        );
        assert_eq!(config.command_prefix, "!");
        assert!(!config.show_pp_for_personal_best);
        assert_eq!(config.amount_of_scores_on_lb, 25);
        assert!(config.auto_update);
        assert!(!config.disable_funorange_maps);
        assert_eq!(config.seasonal_bgs, vec!["a.png", "b.png"]);
        assert_eq!(config.osu_api_key.as_deref(), Some(key.as_str()));
        assert_eq!(config.imgur_client_id, None);
        assert_eq!(config.osu_daily_api_key, None);
        assert_eq!(config.osu_username.as_deref(), Some("cover"));
        assert_eq!(
            config.osu_password.as_deref(),
            Some("5f4dcc3b5aa765d61d8327deb882cf99")
        );
    }

    #[test]
    fn test_custom_prefix_is_lowercased() {
        let script = "None\nNone\nNone\nNone\nn\nn\nn\n$OSU\nn\n50\nn\nn\n\nNone\nNone\nNone\nNone\nNone\n";
        let config = SetupWizard::new(Cursor::new(script), Vec::new())
            .run()
            .unwrap();
        assert_eq!(config.command_prefix, "$osu");
        assert!(config.seasonal_bgs.is_empty());
    }

    #[test]
    fn test_truncated_input_is_an_error() {
        let result = SetupWizard::new(Cursor::new("None\n"), Vec::new()).run();
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }
}
