//! Tile contents: terrain, buildings, and city ownership.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The terrain of a tile.
///
/// Crop, Forest and Mountain are terrain features: they host the basic
/// buildings and are never search candidates. Water hosts nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Field,
    Crop,
    Forest,
    Mountain,
    Water,
}

impl Terrain {
    /// Returns true for terrain that carries a feature (resource or cover).
    pub const fn is_feature(self) -> bool {
        matches!(self, Terrain::Crop | Terrain::Forest | Terrain::Mountain)
    }

    /// Returns the single-character board-notation abbreviation.
    pub const fn notation_char(self) -> char {
        match self {
            Terrain::Field => 'g',
            Terrain::Crop => 'c',
            Terrain::Forest => 't',
            Terrain::Mountain => 'm',
            Terrain::Water => 'w',
        }
    }

    /// Parses terrain from its board-notation abbreviation.
    pub fn from_notation_char(c: char) -> Option<Terrain> {
        match c {
            'g' => Some(Terrain::Field),
            'c' => Some(Terrain::Crop),
            't' => Some(Terrain::Forest),
            'm' => Some(Terrain::Mountain),
            'w' => Some(Terrain::Water),
            _ => None,
        }
    }
}

/// A building standing on a tile.
///
/// The `#[repr(u8)]` discriminant doubles as the bit position in a
/// [`BuildingSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Building {
    City = 0,
    LumberHut = 1,
    Farm = 2,
    Mine = 3,
    Sawmill = 4,
    Windmill = 5,
    Forge = 6,
    Market = 7,
}

/// All building kinds in discriminant order.
pub const ALL_BUILDINGS: [Building; 8] = [
    Building::City,
    Building::LumberHut,
    Building::Farm,
    Building::Mine,
    Building::Sawmill,
    Building::Windmill,
    Building::Forge,
    Building::Market,
];

impl Building {
    /// Returns true for buildings whose level comes from adjacent basic buildings.
    pub const fn is_contributor(self) -> bool {
        matches!(self, Building::Sawmill | Building::Windmill | Building::Forge)
    }

    /// Returns true for kinds a city may hold at most once.
    pub const fn is_advanced(self) -> bool {
        self.is_contributor() || matches!(self, Building::Market)
    }

    /// The basic building that raises this contributor's level.
    pub const fn feeder(self) -> Option<Building> {
        match self {
            Building::Sawmill => Some(Building::LumberHut),
            Building::Windmill => Some(Building::Farm),
            Building::Forge => Some(Building::Mine),
            _ => None,
        }
    }

    /// The terrain this building must be placed on.
    pub const fn site(self) -> Terrain {
        match self {
            Building::LumberHut => Terrain::Forest,
            Building::Farm => Terrain::Crop,
            Building::Mine => Terrain::Mountain,
            _ => Terrain::Field,
        }
    }

    /// Kinds whose adjacency makes this building worth anything.
    ///
    /// Basic buildings pair with the contributor they feed, contributors with
    /// their feeder, and markets with any contributor.
    pub const fn partners(self) -> BuildingSet {
        match self {
            Building::LumberHut => BuildingSet::single(Building::Sawmill),
            Building::Farm => BuildingSet::single(Building::Windmill),
            Building::Mine => BuildingSet::single(Building::Forge),
            Building::Sawmill => BuildingSet::single(Building::LumberHut),
            Building::Windmill => BuildingSet::single(Building::Farm),
            Building::Forge => BuildingSet::single(Building::Mine),
            Building::Market => BuildingSet::CONTRIBUTORS,
            Building::City => BuildingSet::EMPTY,
        }
    }

    /// Returns the single-character board-notation abbreviation.
    pub const fn notation_char(self) -> char {
        match self {
            Building::City => 'C',
            Building::LumberHut => 'L',
            Building::Farm => 'F',
            Building::Mine => 'N',
            Building::Sawmill => 'S',
            Building::Windmill => 'W',
            Building::Forge => 'G',
            Building::Market => 'M',
        }
    }

    /// Parses a building from its board-notation abbreviation.
    pub fn from_notation_char(c: char) -> Option<Building> {
        ALL_BUILDINGS.into_iter().find(|b| b.notation_char() == c)
    }

    const fn bit(self) -> u16 {
        1 << (self as u8)
    }
}

/// A small bitset of building kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BuildingSet(u16);

impl BuildingSet {
    pub const EMPTY: BuildingSet = BuildingSet(0);
    pub const CONTRIBUTORS: BuildingSet = BuildingSet(
        Building::Sawmill.bit() | Building::Windmill.bit() | Building::Forge.bit(),
    );

    pub const fn single(building: Building) -> BuildingSet {
        BuildingSet(building.bit())
    }

    pub const fn contains(self, building: Building) -> bool {
        self.0 & building.bit() != 0
    }

    pub const fn intersects(self, other: BuildingSet) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, building: Building) {
        self.0 |= building.bit();
    }

    pub fn remove(&mut self, building: Building) {
        self.0 &= !building.bit();
    }

    /// Iterates the kinds in the set in discriminant order.
    pub fn iter(self) -> impl Iterator<Item = Building> {
        ALL_BUILDINGS.into_iter().filter(move |b| self.contains(*b))
    }
}

impl FromIterator<Building> for BuildingSet {
    fn from_iter<I: IntoIterator<Item = Building>>(iter: I) -> Self {
        let mut set = BuildingSet::EMPTY;
        for b in iter {
            set.insert(b);
        }
        set
    }
}

/// Identifier shared by every tile of one city.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(String);

impl CityId {
    pub fn new(id: impl Into<String>) -> Self {
        CityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CityId {
    fn from(id: &str) -> Self {
        CityId(id.to_string())
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One cell of the grid. Identity is `(x, y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub x: u16,
    pub y: u16,
    pub terrain: Terrain,
    #[serde(default)]
    pub building: Option<Building>,
    #[serde(default)]
    pub city: Option<CityId>,
}

impl Tile {
    /// Creates a bare field tile owned by no city.
    pub fn field(x: u16, y: u16) -> Self {
        Tile {
            x,
            y,
            terrain: Terrain::Field,
            building: None,
            city: None,
        }
    }

    /// A tile is empty when it is a plain field with no building.
    pub fn is_empty(&self) -> bool {
        self.terrain == Terrain::Field && self.building.is_none()
    }
}
