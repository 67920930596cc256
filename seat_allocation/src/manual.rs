/*!

This is the long-form manual for `seat_allocation` and `seattab`.

## Allocation rules

### Deputies

The seats in play in a district are distributed with the D'Hondt method among the
lists that reach the minimum threshold (3.00% by default, see `SeatRules`). Each seat
goes in turn to the list with the highest `percentage / (seats already won + 1)`.
When two lists have exactly the same quotient, the list with the lowest id wins.

The lists below the threshold are not shown individually in the district results:
their percentages are added up into a single `Others` entry, which never wins seats.
The district detail view (`district_detail`) shows them individually, marked as
not passing the threshold.

### Senators

Two seats go to the list with the highest percentage, one seat to the runner-up.
If fewer seats are in play, the first list takes up to two and the runner-up what
remains. There is no threshold.

### Closing to 100%

Provisional percentages rarely add up to 100%. When the reported percentages of a
district and chamber leave more than 0.01% unaccounted for, the difference is added to
the `Others` entry (created if needed). The `share` of each entry is its percentage
relative to the closed total.

### National aggregation

Seats are summed by alignment over all the districts. The national vote share of an
alignment is the average of its district percentages weighted by the registered voters
of each district. Only the districts with results for the chamber, and with registered
voters, take part in the average.

## Input format

`seattab` reads a JSON snapshot:

```text
{
  "outputSettings": { "reportName": "Provisional results", "reportDate": "2025-10-26" },
  "rules": { "minimumThreshold": "3.00", "percentTolerance": "0.01" },
  "districts": [
    { "id": 1, "name": "Catamarca", "deputySeats": 2, "totalDeputies": 5,
      "senateSeats": 0, "totalSenators": 3, "registeredVoters": 350000 }
  ],
  "lists": [
    { "id": 10, "district": 1, "chamber": "deputies", "order": 1, "code": "501",
      "name": "Frente Norte", "alignment": "Alianza Norte" }
  ],
  "scrutiny": [
    { "list": 10, "percentage": "45.12", "updatedAt": "2025-10-26T21:00:00Z" }
  ],
  "scrutinyFileSources": [
    { "provider": "csv", "filePath": "scrutiny.csv", "hasHeaders": true }
  ]
}
```

Notes:
- `rules`, `scrutiny`, `scrutinyFileSources`, `order`, `alignment`, `totalDeputies`,
  `senateSeats` and `totalSenators` are optional.
- percentages can be JSON strings or numbers, between 0 and 100.
- rule values (`minimumThreshold`, `percentTolerance`) have at most two decimals.
- negative seat or voter counts are rejected.
- when a list has several percentage records, the most recently updated one is used.

### `csv`

Percentage records, one per line, with the columns `list_id,percentage,updated_at`.
Timestamps follow RFC 3339. The file path is relative to the snapshot file.

```text
list_id,percentage,updated_at
10,45.12,2025-10-26T21:00:00Z
11,2.40,2025-10-26T21:05:00Z
```

 */
