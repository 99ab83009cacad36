//! Canned inputs shared by the integration tests.

/// Subschema entry as returned by
/// `ldapsearch -x -b cn=Subschema -s base '(objectClass=*)' +`, trimmed to
/// the core and inetOrgPerson schemas. Some definitions are folded the way
/// ldapsearch wraps long lines.
pub const CORE_SCHEMA: &str = "\
# extended LDIF
#
# LDAPv3
# base <cn=Subschema> with scope baseObject
# filter: (objectClass=*)
# requesting: +
#

# Subschema
dn: cn=Subschema
objectClass: top
objectClass: subentry
objectClass: subschema
objectClass: extensibleObject
cn: Subschema
attributeTypes: ( 2.5.4.0 NAME 'objectClass' DESC 'RFC4512: object classes of
  the entity' EQUALITY objectIdentifierMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.
 38 )
attributeTypes: ( 2.5.4.41 NAME 'name' DESC 'RFC4519: common supertype of name
  attributes' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX
  1.3.6.1.4.1.1466.115.121.1.15{32768} )
attributeTypes: ( 2.5.4.3 NAME ( 'cn' 'commonName' ) DESC 'RFC4519: common name
 (s) for which the entity is known by' SUP name )
attributeTypes: ( 2.5.4.4 NAME ( 'sn' 'surname' ) DESC 'RFC2256: last (family)
  name(s) for which the entity is known by' SUP name )
attributeTypes: ( 2.5.4.42 NAME ( 'givenName' 'gn' ) DESC 'RFC2256: first name
 (s) for which the entity is known by' SUP name )
attributeTypes: ( 2.5.4.12 NAME 'title' DESC 'RFC2256: title associated with t
 he entity' SUP name )
attributeTypes: ( 2.5.4.13 NAME 'description' DESC 'RFC2256: descriptive infor
 mation' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.
 6.1.4.1.1466.115.121.1.15{1024} )
attributeTypes: ( 2.5.4.20 NAME 'telephoneNumber' DESC 'RFC2256: Telephone Num
 ber' EQUALITY telephoneNumberMatch SUBSTR telephoneNumberSubstringsMatch SYNT
 AX 1.3.6.1.4.1.1466.115.121.1.50{32} )
attributeTypes: ( 2.5.4.34 NAME 'seeAlso' DESC 'RFC4519: DN of related object'
  SUP distinguishedName )
attributeTypes: ( 2.5.4.35 NAME 'userPassword' DESC 'RFC4519/2307: password of
  user' EQUALITY octetStringMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.40{128} )
attributeTypes: ( 2.5.4.11 NAME ( 'ou' 'organizationalUnitName' ) DESC 'RFC251
 9: organizational unit this object belongs to' SUP name )
attributeTypes: ( 2.5.4.10 NAME ( 'o' 'organizationName' ) DESC 'RFC2256: orga
 nization this object belongs to' SUP name )
attributeTypes: ( 0.9.2342.19200300.100.1.25 NAME ( 'dc' 'domainComponent' ) D
 ESC 'RFC1274/2247: domain component' EQUALITY caseIgnoreIA5Match SUBSTR caseI
 gnoreIA5SubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.26 SINGLE-VALUE )
attributeTypes: ( 0.9.2342.19200300.100.1.1 NAME ( 'uid' 'userid' ) DESC 'RFC4
 519: user identifier' EQUALITY caseIgnoreMatch SUBSTR caseIgnoreSubstringsMat
 ch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15{256} )
attributeTypes: ( 0.9.2342.19200300.100.1.3 NAME ( 'mail' 'rfc822Mailbox' ) DE
 SC 'RFC1274: RFC822 Mailbox' EQUALITY caseIgnoreIA5Match SUBSTR caseIgnoreIA5
 SubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.26{256} )
attributeTypes: ( 2.16.840.1.113730.3.1.241 NAME 'displayName' DESC 'RFC2798:
 preferred name to be used when displaying entries' EQUALITY caseIgnoreMatch S
 UBSTR caseIgnoreSubstringsMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.15 SINGLE-V
 ALUE )
attributeTypes: ( 2.5.18.1 NAME 'createTimestamp' DESC 'RFC4512: time which ob
 ject was created' EQUALITY generalizedTimeMatch ORDERING generalizedTimeOrder
 ingMatch SYNTAX 1.3.6.1.4.1.1466.115.121.1.24 SINGLE-VALUE NO-USER-MODIFICATI
 ON USAGE directoryOperation )
objectClasses: ( 2.5.6.0 NAME 'top' DESC 'top of the superclass chain' ABSTRAC
 T MUST objectClass )
objectClasses: ( 1.3.6.1.4.1.1466.101.120.111 NAME 'extensibleObject' DESC 'RF
 C4512: extensible object' SUP top AUXILIARY )
objectClasses: ( 2.5.6.6 NAME 'person' DESC 'RFC2256: a person' SUP top STRUCT
 URAL MUST ( sn $ cn ) MAY ( userPassword $ telephoneNumber $ seeAlso $ descri
 ption ) )
objectClasses: ( 2.5.6.7 NAME 'organizationalPerson' DESC 'RFC2256: an organiz
 ational person' SUP person STRUCTURAL MAY ( title $ ou $ telephoneNumber ) )
objectClasses: ( 2.16.840.1.113730.3.2.2 NAME 'inetOrgPerson' DESC 'RFC2798: I
 nternet Organizational Person' SUP organizationalPerson STRUCTURAL MAY ( give
 nName $ uid $ mail $ displayName ) )
objectClasses: ( 2.5.6.5 NAME 'organizationalUnit' DESC 'RFC2256: an organizat
 ional unit' SUP top STRUCTURAL MUST ou MAY ( userPassword $ telephoneNumber $
  seeAlso $ description ) )
objectClasses: ( 2.5.6.4 NAME 'organization' DESC 'RFC2256: an organization' S
 UP top STRUCTURAL MUST o MAY ( userPassword $ telephoneNumber $ seeAlso $ des
 cription ) )
objectClasses: ( 1.3.6.1.4.1.1466.344 NAME 'dcObject' DESC 'RFC2247: domain co
 mponent object' SUP top AUXILIARY MUST dc )

# search result
search: 2
result: 0 Success

# numResponses: 2
# numEntries: 1
";

/// A small directory tree that is valid against [`CORE_SCHEMA`].
pub const VALID_LDIF: &str = "\
version: 1

dn: dc=example,dc=com
objectClass: top
objectClass: dcObject
objectClass: organization
dc: example
o: Example Inc.

dn: ou=people,dc=example,dc=com
objectClass: organizationalUnit
ou: people
description: All the people

dn: uid=jdoe,ou=people,dc=example,dc=com
objectClass: inetOrgPerson
uid: jdoe
cn: John Doe
sn: Doe
givenName: John
mail: jdoe@example.com
commonName:: Sm9obiBEb2U=
";

/// Entries with one problem of every kind the validator reports.
pub const FLAWED_LDIF: &str = "\
dn: cn=ghost,dc=example,dc=com
objectClass: person
cn: ghost

dn: cn=stranger,dc=example,dc=com
objectClass: person
objectClass: alienLifeform
cn: stranger
sn: Stranger
favouriteColour: green

dn: cn=floating,dc=example,dc=com
objectClass: top
objectClass: extensibleObject
cn: floating

dn: cn=overreach,dc=example,dc=com
objectClass: person
cn: overreach
sn: Overreach
mail: overreach@example.com
";

/// LDIF with syntax errors; the well-formed entries around them survive.
pub const BROKEN_LDIF: &str = "\
version: 2

dn: cn=first,dc=example,dc=com
cn: first
this line has no colon

objectClass: top
cn: orphan

dn: cn=second,dc=example,dc=com
cn:: not*base64
cn: second
";
