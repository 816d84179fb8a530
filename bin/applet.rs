use crate::remote::Remote;
use anyhow::Error as Anyhow;
use clap::Subcommand;
use derive_more::From;

mod abort;
mod play;
mod resign;
mod watch;

#[derive(From, Subcommand)]
pub enum Applet {
    Play(play::Play),
    Watch(watch::Watch),
    Resign(resign::Resign),
    Abort(abort::Abort),
}

impl Default for Applet {
    fn default() -> Self {
        play::Play::default().into()
    }
}

impl Applet {
    pub async fn execute(self, remote: Remote) -> Result<(), Anyhow> {
        match self {
            Applet::Play(a) => Ok(a.execute(remote).await?),
            Applet::Watch(a) => Ok(a.execute(remote).await?),
            Applet::Resign(a) => Ok(a.execute(remote).await?),
            Applet::Abort(a) => Ok(a.execute(remote).await?),
        }
    }
}
