//! VIN syntax validation.
//!
//! A valid VIN is exactly 17 characters from [A-HJ-NPR-Z0-9]; the
//! letters I, O and Q never appear. The check digit is not verified,
//! since suppliers routinely send VINs from markets where it is unused.

pub fn validate_vin(vin: &str) -> bool {
    vin.len() == 17
        && vin
            .chars()
            .all(|c| matches!(c, 'A'..='H' | 'J'..='N' | 'P' | 'R'..='Z' | '0'..='9'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_vin() {
        assert!(validate_vin("1HGBH41JXMN109186"));
        assert!(validate_vin("WDBRF40J43F400023"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!validate_vin(""));
        assert!(!validate_vin("1HGBH41JXMN10918"));
        assert!(!validate_vin("1HGBH41JXMN1091867"));
    }

    #[test]
    fn rejects_forbidden_letters() {
        assert!(!validate_vin("IHGBH41JXMN109186"));
        assert!(!validate_vin("1HGBH41JXMN10918O"));
        assert!(!validate_vin("1HGBH41QXMN109186"));
    }

    #[test]
    fn rejects_lowercase() {
        assert!(!validate_vin("1hgbh41jxmn109186"));
    }

    #[test]
    fn checksum_is_not_verified() {
        // Same VIN with a mangled check digit (position 9) still passes,
        // only syntax is in scope.
        assert!(validate_vin("1HGBH41J1MN109186"));
        assert!(validate_vin("1HGBH41J2MN109186"));
    }
}
