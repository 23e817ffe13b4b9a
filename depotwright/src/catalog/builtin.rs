//! Built-in application table.

use super::culture::Culture;
use super::model::{Application, Depot, SharedFile};

const INSTALL_SCRIPT: &str = "installscript.vdf";

fn cultures(codes: &[&str]) -> Vec<Culture> {
    codes.iter().filter_map(|code| Culture::find(code)).collect()
}

fn invariant() -> Vec<Culture> {
    vec![Culture::INVARIANT]
}

fn depot(id: u32, name: &str, base_name: &str, optional: bool, cultures: Vec<Culture>) -> Depot {
    Depot::new(id, name, base_name, optional, cultures)
}

fn script() -> Option<String> {
    Some(INSTALL_SCRIPT.to_string())
}

/// Applications supported out of the box.
pub fn applications() -> Vec<Application> {
    vec![
        defcon(),
        x3_terran_conflict(),
        rage(),
        skyrim(),
        supreme_ruler_cold_war(),
        dead_island(),
        eye(),
        terraria(),
        x3_albion_prelude(),
        skyrim_creation_kit(),
    ]
}

fn defcon() -> Application {
    Application::new(1520, "DEFCON", "Defcon", None).with_depot(depot(
        1521,
        "Defcon Content",
        "Defcon Content",
        false,
        cultures(&["en", "fr", "it", "de", "es"]),
    ))
}

fn x3_terran_conflict() -> Application {
    Application::new(2820, "X3: Terran Conflict", "X3 Terran Conflict", script())
        .with_depot(depot(2827, "X3: A Sunny Place", "x3tc DLC", true, invariant()))
        .with_depot(depot(2826, "X3 Soundtrack", "X3 Soundtrack", true, invariant()))
        .with_depot(depot(
            2821,
            "X3: Terran Conflict content",
            "X3 Terran Conflict content",
            false,
            invariant(),
        ))
        .with_depot(depot(
            2822,
            "X3: Terran Conflict German",
            "X3 Terran Conflict German",
            true,
            cultures(&["de"]),
        ))
        .with_depot(depot(
            2823,
            "X3: Terran Conflict French",
            "X3 Terran Conflict French",
            true,
            cultures(&["fr"]),
        ))
        .with_depot(depot(
            2824,
            "X3: Terran Conflict Italian",
            "X3 Terran Conflict Italian",
            true,
            cultures(&["it"]),
        ))
        .with_depot(depot(
            2825,
            "X3: Terran Conflict English",
            "X3 Terran Conflict English",
            true,
            cultures(&["en"]),
        ))
        .with_depot(depot(
            2828,
            "X3: Terran Conflict Russian",
            "X3TC Russian",
            true,
            cultures(&["ru"]),
        ))
}

fn rage() -> Application {
    let app = Application::new(9200, "RAGE", "RAGE", script())
        .with_depot(depot(9201, "RAGEDepot", "RAGEDepot", false, invariant()))
        .with_depot(depot(
            9240,
            "Rage Authority Pack DLC",
            "Rage Authority Pack DLC",
            true,
            invariant(),
        ))
        .with_depot(depot(9241, "Rage Sewers DLC", "Rage Sewers DLC", true, invariant()))
        .with_depot(depot(9239, "RAGE_EXEDepot", "RAGE_EXEDepot", false, invariant()))
        .with_depot(depot(9238, "RagePatch1Depot", "RagePatch1Depot", false, invariant()));

    let languages = [
        (9202, "english", "en"),
        (9203, "french", "fr"),
        (9204, "spanish", "es"),
        (9205, "italian", "it"),
        (9206, "german", "de"),
        (9207, "Japanese", "ja"),
        (9208, "Russian", "ru"),
        (9209, "Czech", "cs"),
        (9210, "Polish", "pl"),
    ];
    let app = languages.iter().fold(app, |app, (id, language, code)| {
        let name = format!("RAGE {}", language);
        app.with_depot(depot(*id, &name, &name, true, cultures(&[code])))
    });

    // French reuses the intro videos of the main depot; Russian, Czech and
    // Polish reuse the English streamed audio.
    app.with_shared_file(SharedFile::new(
        "common/rage/base/video/loadvideo_french.bik",
        9201,
        vec![9203],
    ))
    .with_shared_file(SharedFile::new(
        "common/rage/mp/base/video/loadvideo_french.bik",
        9201,
        vec![9203],
    ))
    .with_shared_file(SharedFile::new(
        "common/rage/base/english.streamed",
        9202,
        vec![9208, 9209, 9210],
    ))
    .with_shared_file(SharedFile::new(
        "common/rage/mp/base/english.streamed",
        9202,
        vec![9208, 9209, 9210],
    ))
}

fn skyrim() -> Application {
    let app = Application::new(72850, "The Elder Scrolls V: Skyrim", "Skyrim", script())
        .with_depot(depot(72851, "Skyrim Content", "Skyrim Content", false, invariant()))
        .with_depot(depot(72852, "Skyrim exe", "Skyrim exe", true, invariant()))
        .with_depot(depot(
            202485,
            "Skyrim High Resolution Texture Pack",
            "Skyrim High Resolution Texture Pack",
            true,
            invariant(),
        ));

    let languages = [
        (72853, "english", "Skyrim english", "en"),
        (72854, "french", "Skyrim french", "fr"),
        (72855, "italian", "Skyrim italian", "it"),
        (72856, "german", "Skyrim german", "de"),
        (72857, "spanish", "Skyrim spanish", "es"),
        (72858, "Polish", "Skyrim Polish", "pl"),
        (72859, "Czech", "Skyrim Czech", "cs"),
        (72860, "Russian", "Skyrim Russian", "ru"),
        (
            72861,
            "Japanese",
            "The Elder Scrolls V Skyrim Japanese",
            "ja",
        ),
    ];
    let app = languages
        .iter()
        .fold(app, |app, (id, language, base_name, code)| {
            let name = format!("The Elder Scrolls V: Skyrim {}", language);
            app.with_depot(depot(*id, &name, base_name, true, cultures(&[code])))
        });

    // Polish and Czech ship text only and reuse the English voices.
    app.with_shared_file(SharedFile::new(
        "common/Skyrim/Data/Skyrim - Voices.bsa",
        72853,
        vec![72858, 72859],
    ))
    .with_shared_file(SharedFile::new(
        "common/Skyrim/Data/Skyrim - VoicesExtra.bsa",
        72853,
        vec![72858, 72859],
    ))
}

fn supreme_ruler_cold_war() -> Application {
    Application::new(73220, "Supreme Ruler: Cold War", "Supreme Ruler Cold War", None).with_depot(
        depot(
            73221,
            "Supreme Ruler Cold War content",
            "Supreme Ruler Cold War content",
            false,
            cultures(&["en", "fr", "de", "es"]),
        ),
    )
}

fn dead_island() -> Application {
    let app = Application::new(91310, "Dead Island", "Dead Island", script())
        .with_depot(depot(
            91318,
            "Dead Island Binaries",
            "Dead Island Binaries",
            true,
            invariant(),
        ))
        .with_depot(depot(
            91311,
            "Dead Island GameContent",
            "Dead Island GameContent",
            false,
            invariant(),
        ))
        .with_depot(depot(91342, "Dead Island: Ripper_2.0", "Ripper_2.0", true, invariant()))
        .with_depot(depot(
            91345,
            "Dead Island: Bloodbath",
            "Dead Island Bloodbath",
            true,
            invariant(),
        ))
        .with_depot(depot(91346, "Dead Island: Ryder", "Dead Island Ryder", true, invariant()))
        .with_depot(depot(
            91347,
            "Dead Island SpeechRu",
            "Dead Island SpeechRu",
            true,
            invariant(),
        ))
        .with_depot(depot(200931, "DeadIslSndContent", "DeadIslSndContent", true, invariant()))
        .with_depot(depot(
            201741,
            "Dead Island Bloodbath VoiceOver Content",
            "BloodbathEN",
            true,
            invariant(),
        ));

    let languages = [
        (91312, "english", "en"),
        (91313, "french", "fr"),
        (91314, "italian", "it"),
        (91315, "german", "de"),
        (91316, "spanish", "es"),
        (91317, "Polish", "pl"),
        (91341, "Czech", "cs"),
        (91343, "Russian", "ru"),
        (91348, "Japanese", "ja"),
    ];
    let app = languages.iter().fold(app, |app, (id, language, code)| {
        let name = format!("Dead Island {}", language);
        app.with_depot(depot(*id, &name, &name, true, cultures(&[code])))
    });

    app.with_depot(depot(
        201742,
        "Dead Island Russian Bloodbath DLC",
        "BloodbathRU",
        true,
        cultures(&["ru"]),
    ))
    .with_depot(depot(
        201743,
        "Dead Island Japanese Bloodbath DLC",
        "BloodbathJP",
        true,
        cultures(&["ja"]),
    ))
}

fn eye() -> Application {
    Application::new(91700, "E.Y.E", "EYE", None).with_depot(depot(
        91701,
        "E.Y.E content",
        "E.Y.E content",
        false,
        cultures(&["en", "fr"]),
    ))
}

fn terraria() -> Application {
    Application::new(105600, "Terraria", "Terraria", script()).with_depot(depot(
        105601,
        "TerrariaRelease",
        "TerrariaRelease",
        false,
        cultures(&["en", "fr", "it", "de", "es"]),
    ))
}

fn x3_albion_prelude() -> Application {
    Application::new(
        201310,
        "X3: Albion Prelude",
        "x3 terran conflict",
        Some("installscript-x3ap.vdf".to_string()),
    )
    .with_depot(depot(
        201311,
        "X3: Albion Prelude content",
        "x3ap content",
        false,
        invariant(),
    ))
    .with_depot(depot(
        201312,
        "X3: Albion Prelude english",
        "X3AP english",
        true,
        cultures(&["en"]),
    ))
    .with_depot(depot(
        201313,
        "X3: Albion Prelude german",
        "X3AP german",
        true,
        cultures(&["de"]),
    ))
    .with_depot(depot(
        201314,
        "X3: Albion Prelude french",
        "X3AP french",
        true,
        cultures(&["fr"]),
    ))
    .with_depot(depot(
        201315,
        "X3: Albion Prelude italian",
        "X3AP italian",
        true,
        cultures(&["it"]),
    ))
    .with_depot(depot(
        201316,
        "X3: Albion Prelude Russian",
        "X3AP Russian",
        true,
        cultures(&["ru"]),
    ))
    // The Russian depot reuses two English movie files.
    .with_shared_file(SharedFile::new(
        "common/x3 terran conflict/addon/mov/00144.dat",
        201312,
        vec![201316],
    ))
    .with_shared_file(SharedFile::new(
        "common/x3 terran conflict/addon/mov/00244.dat",
        201312,
        vec![201316],
    ))
}

fn skyrim_creation_kit() -> Application {
    Application::new(202480, "The Elder Scrolls V: Skyrim Creation Kit", "skyrim", None)
        .with_depot(depot(
            202481,
            "CreationKit Main",
            "CreationKit Main",
            false,
            cultures(&["en"]),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let apps = applications();
        let mut ids: Vec<u32> = apps.iter().map(Application::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), apps.len());
    }

    #[test]
    fn test_shared_files_reference_existing_depots() {
        for app in applications() {
            for shared in app.shared_files() {
                assert!(app.depot(shared.source()).is_some(), "{}", app.name());
                for client in shared.clients() {
                    assert!(app.depot(*client).is_some(), "{}", app.name());
                }
            }
        }
    }

    #[test]
    fn test_rage_language_depots() {
        let rage = rage();
        let french = rage.depot(9203).unwrap();
        assert_eq!(french.base_name(), "RAGE french");
        assert!(french.is_optional());
        assert_eq!(french.cultures()[0].code(), "fr");
        assert_eq!(rage.shared_files().len(), 4);
    }

    #[test]
    fn test_every_depot_has_cultures() {
        for app in applications() {
            for depot in app.depots() {
                assert!(!depot.cultures().is_empty());
            }
        }
    }
}
