//! Static rule-type knowledge: type keys, cross-reference targets,
//! forced retargets and metadata fields.

/// Rule sections whose entries are named by a type-key field.
pub(crate) const TYPE_KEYS: &[(&str, &str)] = &[
    ("MCDPatches", "type"),
    ("alienDeployments", "type"),
    ("alienMissions", "type"),
    ("alienRaces", "id"),
    ("arcScripts", "type"),
    ("armors", "type"),
    ("commendations", "type"),
    ("countries", "type"),
    ("covertOperations", "name"),
    ("craftWeapons", "type"),
    ("crafts", "type"),
    ("customPalettes", "type"),
    ("cutscenes", "type"),
    ("enviroEffects", "type"),
    ("eventScripts", "type"),
    ("events", "name"),
    ("extraSounds", "type"),
    ("extraSprites", "type"),
    ("facilities", "type"),
    ("interfaces", "type"),
    ("invs", "id"),
    ("items", "type"),
    ("manufacture", "name"),
    ("mapScripts", "type"),
    ("missionScripts", "type"),
    ("musics", "type"),
    ("regions", "type"),
    ("research", "name"),
    ("skills", "name"),
    ("soldierBonuses", "name"),
    ("soldierTransformation", "name"),
    ("soldiers", "type"),
    ("soundDefs", "type"),
    ("startingConditions", "type"),
    ("terrains", "name"),
    ("ufoTrajectories", "id"),
    ("ufopaedia", "id"),
    ("ufos", "type"),
    ("units", "type"),
];

/// Sections whose `files` mapping keys are definitions of their own.
pub(crate) const EXTRA_FILE_SECTIONS: &[&str] = &["extraSprites", "extraSounds"];

/// Section holding per-language string tables inside ruleset files.
pub(crate) const STRINGS_SECTION: &str = "extraStrings";

/// Fallback type key for `extraSprites` entries that declare a single image.
pub(crate) const SINGLE_SPRITE_TYPE_KEY: &str = "typeSingle";

/// `sourceType.key` -> rule types an identifier found there may resolve to.
pub(crate) const TARGETS: &[(&str, &[&str])] = &[
    ("alienDeployments.missionBountyItem", &["items"]),
    ("alienDeployments.nextStage", &["alienDeployments"]),
    ("alienDeployments.script", &["mapScripts"]),
    ("alienDeployments.terrains", &["terrains"]),
    ("alienDeployments.unlockedResearch", &["research"]),
    ("alienMissions.waves[].ufo", &["ufos"]),
    ("alienRaces.members", &["units"]),
    ("arcScripts.researchTriggers", &["research"]),
    ("armors.corpseBattle", &["items"]),
    ("armors.corpseGeo", &["items"]),
    ("armors.specialWeapon", &["items"]),
    ("armors.storeItem", &["items"]),
    ("armors.units", &["soldiers", "units"]),
    ("craftWeapons.clip", &["items"]),
    ("craftWeapons.launcher", &["items"]),
    ("crafts.requires", &["research"]),
    ("events.itemList", &["items"]),
    ("events.researchList", &["research"]),
    ("facilities.requires", &["research"]),
    ("items.compatibleAmmo", &["items"]),
    ("items.requires", &["research"]),
    ("items.requiresBuy", &["research"]),
    ("items.spawnUnit", &["units"]),
    ("items.zombieUnit", &["units"]),
    ("manufacture.producedItems", &["items", "crafts"]),
    ("manufacture.requiredItems", &["items", "crafts"]),
    ("manufacture.requires", &["research"]),
    ("mapScripts.commands[].terrain", &["terrains"]),
    ("missionScripts.researchTriggers", &["research"]),
    ("research.dependencies", &["research"]),
    ("research.disables", &["research"]),
    ("research.getOneFree", &["research"]),
    ("research.lookup", &["research"]),
    ("research.requires", &["research"]),
    ("research.unlocks", &["research"]),
    ("soldierTransformation.allowedSoldierTypes", &["soldiers"]),
    ("soldierTransformation.producedSoldierType", &["soldiers"]),
    ("soldierTransformation.requires", &["research"]),
    ("soldiers.armor", &["armors"]),
    ("startingConditions.allowedArmors", &["armors"]),
    ("startingConditions.allowedCraft", &["crafts"]),
    ("startingConditions.allowedItems", &["items"]),
    ("ufopaedia.requires", &["research"]),
    ("units.armor", &["armors"]),
];

/// How an identifier is rewritten before it is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyRewrite {
    Keep,
    Suffix(&'static str),
}

/// `sourceType.key` -> the one rule type that must be matched, plus key rewrite.
pub(crate) const LOGIC_OVERRIDES: &[(&str, &str, KeyRewrite)] = &[
    ("armors.spriteInv", "extraSprites", KeyRewrite::Suffix(".SPK")),
    ("armors.spriteSheet", "extraSprites", KeyRewrite::Keep),
    ("craftWeapons.sprite", "extraSprites.INTICON.PCK.files", KeyRewrite::Keep),
    ("crafts.sprite", "extraSprites.INTICON.PCK.files", KeyRewrite::Keep),
    ("facilities.spriteFacility", "extraSprites.BASEBITS.PCK.files", KeyRewrite::Keep),
    ("facilities.spriteShape", "extraSprites.BASEBITS.PCK.files", KeyRewrite::Keep),
    ("items.bigSprite", "extraSprites.BIGOBS.PCK.files", KeyRewrite::Keep),
    ("items.bulletSprite", "extraSprites.Projectiles.files", KeyRewrite::Keep),
    ("items.explosionHitSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("items.fireSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("items.floorSprite", "extraSprites.FLOOROB.PCK.files", KeyRewrite::Keep),
    ("items.handSprite", "extraSprites.HANDOB.PCK.files", KeyRewrite::Keep),
    ("items.hitAnimation", "extraSprites.SMOKE.PCK.files", KeyRewrite::Keep),
    ("items.hitMissSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("items.hitSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("items.meleeHitSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("items.meleeSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("ufopaedia.image_id", "extraSprites", KeyRewrite::Keep),
    ("ufos.sprite", "extraSprites.INTICON.PCK.files", KeyRewrite::Keep),
    ("units.aggroSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("units.deathSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
    ("units.moveSound", "extraSounds.BATTLE.CAT.files", KeyRewrite::Keep),
];

/// Dotted entry path -> fields captured as metadata for a match under it.
pub(crate) const METADATA_FIELDS: &[(&str, &[&str])] = &[
    ("extraSprites", &["width", "height", "subX", "subY", "singleImage"]),
    ("interfaces.elements[]", &["color", "color2", "border"]),
];
