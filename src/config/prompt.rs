use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use log::info;

const CLASSIC_PROMPT: &str = "Du bist ein KI‑Reiseagent‑Prototyp mit folgendem Workflow:
1. Stelle gezielt Rückfragen nach Reisedaten, Budget (Total oder pro Tag), Interessen, Reisestil, Unterkunftsklasse.
2. Wenn du alle Eckdaten hast, generiere einen strukturierten Reiseplan:
   ‑ Tagesweise Aktivitäten mit Zeiten,
   ‑ Vorschläge für Transportmittel und geschätzte Dauer,
   ‑ Unterkunftsoptionen (Preisklasse),
   ‑ Budgetaufteilung (Flug, Unterkunft, Aktivitäten).
3. Gib das Ergebnis als JSON mit klarer Struktur, außerdem als Text fürs Frontend.
4. Kommuniziere stets als freundlicher Reiseberater.
5. Falls Angaben fehlen oder unrealistisch sind, bitte nach.";

const BUNDLED_PROMPT: &str = "Du bist ein freundlicher KI-Reiseagent mit folgendem Workflow:

1. Stelle am Anfang klare, gebündelte Fragen, damit du alle notwendigen Details erhältst:
   – Reisezeitraum (Start- und Enddatum)
   – Reiseziel(e)
   – Gesamtbudget oder Tagesbudget
   – Interessen (Strand, Kultur, Natur, Nightlife, Kulinarik, usw.)
   – Reisestil / Unterkunftstyp (Hostel, Mittelklasse-Hotel, Luxus)

2. Passe deine Rückfragen dynamisch an die Antworten des Nutzers an. Wenn jemand z.B. „Strand“ erwähnt, frage nach Präferenz für Wassersport oder Entspannen. Vermeide redundante Fragen.

3. Wenn alle Eckdaten vorhanden sind, erstelle einen strukturierten Reiseplan:
   – Tagesweise Aktivitäten mit Uhrzeiten
   – Vorschläge für Transportmittel inkl. geschätzter Dauer
   – Geeignete Unterkünfte (Preisoptionen)
   – Budgetaufteilung für Flüge, Unterkunft und Aktivitäten

4. Liefere das Ergebnis als JSON-Struktur (Tag, Datum, Aktivitäten, Transport, Kosten) und eine leicht lesbare Zusammenfassung.

5. Kommuniziere höflich und sympathisch. Wenn Angaben fehlen oder unrealistisch sind, bitte in einem freundlichen, erklärenden Ton nach.

Beachte: Alle Kosten und Zeiten sind grobe Schätzwerte.";

#[derive(Debug)]
pub enum PromptError {
    UnknownVariant(String),
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl fmt::Display for PromptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptError::UnknownVariant(key) => write!(f, "Prompt variant '{}' not found", key),
            PromptError::IoError(e) => write!(f, "Prompt file IO error: {}", e),
            PromptError::JsonError(e) => write!(f, "Prompt JSON parsing error: {}", e),
        }
    }
}

impl Error for PromptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PromptError::IoError(e) => Some(e),
            PromptError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PromptError {
    fn from(err: std::io::Error) -> Self {
        PromptError::IoError(err)
    }
}

impl From<serde_json::Error> for PromptError {
    fn from(err: serde_json::Error) -> Self {
        PromptError::JsonError(err)
    }
}

/// The two persona texts the travel agent ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptVariant {
    /// Five-step workflow: ask, plan, answer as JSON plus text.
    Classic,
    /// Bundled up-front questions with adaptive follow-ups.
    Bundled,
}

impl PromptVariant {
    pub fn key(&self) -> &'static str {
        match self {
            PromptVariant::Classic => "classic",
            PromptVariant::Bundled => "bundled",
        }
    }
}

impl fmt::Display for PromptVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PromptVariant {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Ok(PromptVariant::Classic),
            "bundled" => Ok(PromptVariant::Bundled),
            _ => Err(PromptError::UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
struct PromptOverrides {
    classic: Option<String>,
    bundled: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptCatalog {
    classic: String,
    bundled: String,
}

impl PromptCatalog {
    pub fn builtin() -> Self {
        Self {
            classic: CLASSIC_PROMPT.to_string(),
            bundled: BUNDLED_PROMPT.to_string(),
        }
    }

    pub fn system_prompt(&self, variant: PromptVariant) -> &str {
        match variant {
            PromptVariant::Classic => &self.classic,
            PromptVariant::Bundled => &self.bundled,
        }
    }
}

impl Default for PromptCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Loads a JSON object of `{ "classic": ..., "bundled": ... }`. Keys that are
/// absent keep their builtin text.
pub fn load_prompts<P: AsRef<Path>>(path: P) -> Result<PromptCatalog, PromptError> {
    let file_content = fs::read_to_string(&path)?;
    let overrides: PromptOverrides = serde_json::from_str(&file_content)?;

    let mut catalog = PromptCatalog::builtin();
    if let Some(text) = overrides.classic {
        info!("Overriding '{}' prompt from {}", PromptVariant::Classic, path.as_ref().display());
        catalog.classic = text;
    }
    if let Some(text) = overrides.bundled {
        info!("Overriding '{}' prompt from {}", PromptVariant::Bundled, path.as_ref().display());
        catalog.bundled = text;
    }
    Ok(catalog)
}
