/// Calculate the key tag of a DNSKEY from its RDATA (RFC 4034 Appendix B)
pub fn calculate_key_tag(rdata: &[u8]) -> u16 {
    // RSA/MD5 keys use the most significant 16 of the least significant 24
    // bits of the modulus (Appendix B.1)
    if rdata.get(3) == Some(&1) {
        let key = &rdata[4..];
        if key.len() >= 3 {
            return u16::from_be_bytes([key[key.len() - 3], key[key.len() - 2]]);
        }
        return 0;
    }

    // Wrapping keeps oversized input from overflowing; RDATA that fits in a
    // record never gets near the limit
    let mut accumulator: u32 = 0;
    for (i, &byte) in rdata.iter().enumerate() {
        let word = if i % 2 == 0 {
            u32::from(byte) << 8
        } else {
            u32::from(byte)
        };
        accumulator = accumulator.wrapping_add(word);
    }

    accumulator = accumulator.wrapping_add((accumulator >> 16) & 0xFFFF);
    (accumulator & 0xFFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn rdata(flags: u16, algorithm: u8, public_key: &[u8]) -> Vec<u8> {
        let mut rdata = flags.to_be_bytes().to_vec();
        rdata.push(3);
        rdata.push(algorithm);
        rdata.extend_from_slice(public_key);
        rdata
    }

    #[test]
    fn test_key_tag_root_ksk_2017() {
        let key = STANDARD
            .decode(
                "AwEAAaz/tAm8yTn4Mfeh5eyI96WSVexTBAvkMgJzkKTOiW1vkIbzxeF3+/\
                4RgWOq7HrxRixHlFlExOLAJr5emLvN7SWXgnLh4+B5xQlNVz8Og8kvArMt\
                NROxVQuCaSnIDdD5LKyWbRd2n9WGe2R8PzgCmr3EgVLrjyBxWezF0jLHwV\
                N8efS3rCj/EWgvIWgb9tarpVUDK/b58Da+sqqls3eNbuv7pr+eoZG+SrDK\
                6nWeL3c6H5Apxz7LjVc1uTIdsIXxuOLYA4/ilBmSVIzuDWfdRUfhHdY6+c\
                n8HFRm+2hM8AnXGXws9555KrUB5qihylGa8subX2Nn6UwNR1AkUTV74bU=",
            )
            .unwrap();
        assert_eq!(calculate_key_tag(&rdata(257, 8, &key)), 20326);
    }

    #[test]
    fn test_key_tag_root_ksk_2010() {
        let key = STANDARD
            .decode(
                "AwEAAagAIKlVZrpC6Ia7gEzahOR+9W29euxhJhVVLOyQbSEW0O8gcCjF\
                FVQUTf6v58fLjwBd0YI0EzrAcQqBGCzh/RStIoO8g0NfnfL2MTJRkxoX\
                bfDaUeVPQuYEhg37NZWAJQ9VnMVDxP/VHL496M/QZxkjf5/Efucp2gaD\
                X6RS6CXpoY68LsvPVjR0ZSwzz1apAzvN9dlzEheX7ICJBBtuA6G3LQpz\
                W5hOA2hzCTMjJPJ8LbqF6dsV6DoBQzgul0sGIcGOYl7OyQdXfZ57relS\
                Qageu+ipAdTTJ25AsRTAoub8ONGcLmqrAmRLKBP1dfwhYB4N7knNnulq\
                QxA+Uk1ihz0=",
            )
            .unwrap();
        assert_eq!(calculate_key_tag(&rdata(257, 8, &key)), 19036);
    }

    #[test]
    fn test_key_tag_rsamd5() {
        let key = [0x12, 0x34, 0x56, 0x78];
        assert_eq!(calculate_key_tag(&rdata(257, 1, &key)), 0x3456);
        assert_eq!(calculate_key_tag(&rdata(257, 1, &[0x01])), 0);
    }

    #[test]
    fn test_key_tag_oversized_rdata() {
        // Far beyond what a record can hold, still computes a tag
        let rdata = rdata(257, 15, &vec![0xFF; 140_000]);
        let expected = {
            let sum: u64 = rdata
                .iter()
                .enumerate()
                .map(|(i, &b)| if i % 2 == 0 { u64::from(b) << 8 } else { u64::from(b) })
                .sum();
            let sum = sum as u32;
            (sum.wrapping_add((sum >> 16) & 0xFFFF) & 0xFFFF) as u16
        };
        assert_eq!(calculate_key_tag(&rdata), expected);
    }

    #[test]
    fn test_key_tag_folds_carry() {
        // 0xFFFF + 0xFFFF = 0x1FFFE, folding the carry gives 0xFFFF
        assert_eq!(calculate_key_tag(&[0xFF, 0xFF, 0xFF, 0xFF]), 0xFFFF);
    }
}
