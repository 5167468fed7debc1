pub const CRAB: &str = r"
      _~^~^~_
  \) /  o o  \ (/
    '_   -   _'
    / '-----' \
   word  crab
";
