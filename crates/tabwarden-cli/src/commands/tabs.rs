use clap::Subcommand;
use tabwarden_core::Command;

#[derive(Subcommand)]
pub enum TabsAction {
    /// Set the maximum number of open tabs
    SetMax {
        max_tabs: u32,
    },
    /// Remove the tab cap
    Clear,
    /// Print the current cap
    Show,
}

pub fn run(action: TabsAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TabsAction::SetMax { max_tabs } => super::apply(Command::SetMaxTabs {
            max_tabs: Some(max_tabs),
        }),
        TabsAction::Clear => super::apply(Command::SetMaxTabs { max_tabs: None }),
        TabsAction::Show => {
            let (bg, now) = super::offline_service()?;
            match bg.status(now)?.lockdown.max_tabs {
                Some(n) => println!("{n}"),
                None => println!("unset"),
            }
            Ok(())
        }
    }
}
