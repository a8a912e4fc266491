use super::domain::Team;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    English,
    French,
    German,
    BrazilianPortuguese,
}

impl Language {
    /// Accepts language codes as well as the legacy numeric index (0-3).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "0" | "en" | "english" => Some(Self::English),
            "1" | "fr" | "french" => Some(Self::French),
            "2" | "de" | "german" => Some(Self::German),
            "3" | "pt" | "pt-br" | "brazilian-portuguese" => Some(Self::BrazilianPortuguese),
            _ => None,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::English => 0,
            Self::French => 1,
            Self::German => 2,
            Self::BrazilianPortuguese => 3,
        }
    }
}

/// Translatable strings used in leaderboards and grant notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phrase {
    NoStatsYet,
    Allies,
    Axis,
    BestPlayers,
    ArmyCommander,
    Infantry,
    Tankers,
    BestSquads,
    Offense,
    Defense,
    Combat,
    Support,
    Ratio,
    KillRate,
    VipUntil,
    AlreadyVip,
}

impl Phrase {
    const fn variants(self) -> [&'static str; 4] {
        match self {
            Self::NoStatsYet => [
                "No stats yet",
                "Pas de stats",
                "noch keine Statistiken",
                "Sem estatísticas ainda",
            ],
            Self::Allies => ["all", "all", "Allierte", "ALIADOS"],
            Self::Axis => ["axi", "axe", "Achsenmächte", "EIXO"],
            Self::BestPlayers => [
                "Best players",
                "Meilleurs joueurs",
                "Beste Spieler",
                "TOP »BAIN« PLAYERS",
            ],
            Self::ArmyCommander => ["Commander", "Commandant", "Kommandant", "TOP COMANDANTE"],
            Self::Infantry => ["Infantry", "Infanterie", "Infanterie", "TOP INFANTARIA"],
            Self::Tankers => ["Tankers", "Tankistes", "Panzerspieler", "TOP TANKISTA"],
            Self::BestSquads => [
                "Best squads",
                "Meilleures squads",
                "Beste Mannschaften",
                "TOP ESQUADRÃO",
            ],
            Self::Offense => ["attack", "attaque", "Angriff", "ATAQUE"],
            Self::Defense => ["defense", "défense", "Verteidigung", "DEFESA"],
            Self::Combat => ["combat", "combat", "Kampf", "COMBATE"],
            Self::Support => ["support", "soutien", "Unterstützung", "SUPORTE"],
            Self::Ratio => ["ratio", "ratio", "Verhältnis", "PROPORÇÃO"],
            Self::KillRate => ["kills/min", "kills/min", "Kills/min", "ABATERS/MIN"],
            Self::VipUntil => ["VIP until", "VIP jusqu'au", "VIP bis", "VIP ATÉ"],
            Self::AlreadyVip => ["Already VIP !", "Déjà VIP !", "bereits VIP !", "JÁ É VIP!"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locale {
    language: Language,
}

impl Locale {
    pub const fn new(language: Language) -> Self {
        Self { language }
    }

    pub const fn language(&self) -> Language {
        self.language
    }

    pub const fn text(&self, phrase: Phrase) -> &'static str {
        phrase.variants()[self.language.index()]
    }

    pub const fn team(&self, team: Team) -> &'static str {
        match team {
            Team::Allies => self.text(Phrase::Allies),
            Team::Axis => self.text(Phrase::Axis),
        }
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new(Language::English)
    }
}
