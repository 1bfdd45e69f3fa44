/// Every image the default world can ask for, by id (`<id>.png` under the
/// sprites directory).
pub(crate) const MANIFEST: &[&str] = &[
    "axe",
    "axeRight",
    "character",
    "slime",
    "slime1",
    "slimeDamaged",
    "grass",
    "grass1",
    "heart",
    "houseDoor",
    "leaf",
    "log",
    "money",
    "path",
    "pathVertical",
    "pathHorizontal",
    "pathCrossTop",
    "pathCrossBottom",
    "pathCrossRight",
    "pathCrossLeft",
    "pathEndTop",
    "pathEndBottom",
    "pathEndRight",
    "pathEndLeft",
    "pathCornerTopRight",
    "pathCornerTopLeft",
    "pathCornerBottomRight",
    "pathCornerBottomLeft",
    "plank",
    "rock",
    "roof",
    "stair",
    "sword",
    "sword1",
    "sword2",
    "swordRight",
    "sword1Right",
    "sword2Right",
    "wall",
    "wallShopSign",
    "woman",
    "caveEntrance",
    "caveFloor",
    "player",
    "player1",
    "player2",
    "playerDamaged",
    "playerRight",
    "player1Right",
    "player2Right",
    "playerDamagedRight",
    "playerHorse",
    "playerHorse1",
    "playerHorse2",
    "playerHorseRight",
    "playerHorse1Right",
    "playerHorse2Right",
    "healthPotion",
    "speedPotion",
    "villageShopOwner",
    "horse",
    "armor",
    "pickaxe",
    "pickaxeRight",
    "miner",
    "water",
    "missing",
];
