//! Interface GUIDs advertised in device descriptors.

use std::fmt;

use uuid::Uuid;

/// Mad Catz guitar.
pub const MADCATZ_GUITAR: Uuid = Uuid::from_u128(0x0D2AE438_7F7D_4933_8693_30FC55018E77);

/// Mad Catz drumkit.
pub const MADCATZ_DRUMKIT: Uuid = Uuid::from_u128(0x06182893_CCE0_4B85_9271_0A10DBAB7E07);

/// PDP drumkit. The PDP guitar interface is not known yet.
pub const PDP_DRUMKIT: Uuid = Uuid::from_u128(0xA503F9B0_955E_47C4_A2ED_B1336FA7703E);

/// Mad Catz wireless adapter for legacy instruments.
pub const MADCATZ_LEGACY_WIRELESS: Uuid = Uuid::from_u128(0xAF259D0F_76B0_4CDB_BFD1_CEA8C0A8F5EE);

/// Generic input device interface, present on most controllers.
pub const INPUT_DEVICE: Uuid = Uuid::from_u128(0x9776FF56_9BFD_4581_AD45_B645BBA526D6);

/// Navigation controller interface.
pub const NAVIGATION_CONTROLLER: Uuid = Uuid::from_u128(0xB8F31FE7_7386_40E9_A9F8_2F21263ACFB7);

/// The kind of instrument a descriptor identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Guitar,
    Drumkit,
    LegacyWireless,
}

impl DeviceKind {
    /// Kind for a single interface GUID.
    pub fn from_interface(guid: &Uuid) -> Option<Self> {
        match *guid {
            MADCATZ_GUITAR => Some(Self::Guitar),
            MADCATZ_DRUMKIT | PDP_DRUMKIT => Some(Self::Drumkit),
            MADCATZ_LEGACY_WIRELESS => Some(Self::LegacyWireless),
            _ => None,
        }
    }

    /// First recognized interface in descriptor order.
    pub fn from_interfaces(guids: &[Uuid]) -> Option<Self> {
        guids.iter().find_map(Self::from_interface)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guitar => "guitar",
            Self::Drumkit => "drumkit",
            Self::LegacyWireless => "legacy-wireless",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable name for a known interface GUID.
pub fn interface_name(guid: &Uuid) -> Option<&'static str> {
    match *guid {
        MADCATZ_GUITAR => Some("MadCatzGuitar"),
        MADCATZ_DRUMKIT => Some("MadCatzDrumkit"),
        PDP_DRUMKIT => Some("PdpDrumkit"),
        MADCATZ_LEGACY_WIRELESS => Some("MadCatzLegacyWireless"),
        INPUT_DEVICE => Some("InputDevice"),
        NAVIGATION_CONTROLLER => Some("NavigationController"),
        _ => None,
    }
}
